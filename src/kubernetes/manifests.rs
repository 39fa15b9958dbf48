// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The three manifests the chatbot is deployed with: secret, deployment
//! (with its configuration), and service.

use crate::config::Config;
use crate::constants::resources;
use crate::error::{DeployError, Result};
use crate::image::ImageSpec;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service};
use kube::api::ObjectMeta;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Kind and name of one object inside a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Resource type as kubectl accepts it on the command line
    pub fn kubectl_type(&self) -> String {
        self.kind.to_lowercase()
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kubectl_type(), self.name)
    }
}

/// Which of the three manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Secret,
    Deployment,
    Service,
}

impl Stage {
    /// Credentials first so pods can mount them, the service last so it selects running pods
    pub const APPLY_ORDER: [Stage; 3] = [Stage::Secret, Stage::Deployment, Stage::Service];
    /// Stop traffic, then the workload, then remove credentials
    pub const DELETE_ORDER: [Stage; 3] = [Stage::Service, Stage::Deployment, Stage::Secret];

    pub fn file_name(self) -> &'static str {
        match self {
            Stage::Secret => resources::SECRET_FILE,
            Stage::Deployment => resources::DEPLOYMENT_FILE,
            Stage::Service => resources::SERVICE_FILE,
        }
    }

    /// Kind that must be present in this stage's manifest
    fn required_kind(self) -> &'static str {
        match self {
            Stage::Secret => "Secret",
            Stage::Deployment => "Deployment",
            Stage::Service => "Service",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Secret => "secret",
            Stage::Deployment => "deployment",
            Stage::Service => "service",
        })
    }
}

/// One manifest: its YAML text and the objects it declares
#[derive(Debug, Clone)]
pub struct Manifest {
    pub stage: Stage,
    pub yaml: String,
    pub resources: Vec<ResourceRef>,
    /// Label selector of the first Deployment, as `key=value[,key=value]`
    pub pod_selector: Option<String>,
}

impl Manifest {
    /// Parse a (possibly multi-document) manifest and record its objects
    pub fn parse(stage: Stage, yaml: String) -> Result<Self> {
        let mut found = Vec::new();
        let mut pod_selector = None;

        for document in serde_yaml::Deserializer::from_str(&yaml) {
            let value = serde_yaml::Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }

            let kind = value.get("kind").and_then(|k| k.as_str()).ok_or_else(|| {
                DeployError::Manifest(format!("{} manifest has a document without 'kind'", stage))
            })?;
            let name = value
                .get("metadata")
                .and_then(|m| m.get("name"))
                .and_then(|n| n.as_str())
                .ok_or_else(|| {
                    DeployError::Manifest(format!(
                        "{} manifest has a {} without metadata.name",
                        stage, kind
                    ))
                })?;

            if kind == "Deployment" && pod_selector.is_none() {
                pod_selector = match_labels(&value);
            }
            found.push(ResourceRef::new(kind, name));
        }

        let manifest = Self {
            stage,
            yaml,
            resources: found,
            pod_selector,
        };

        if manifest.find(stage.required_kind()).is_none() {
            return Err(DeployError::Manifest(format!(
                "{} manifest does not declare a {}",
                stage,
                stage.required_kind()
            )));
        }

        Ok(manifest)
    }

    /// First object of the given kind
    pub fn find(&self, kind: &str) -> Option<&ResourceRef> {
        self.resources.iter().find(|r| r.kind == kind)
    }

    /// Objects in the order they should be removed: primary kind first, then what it depends on
    pub fn removal_order(&self) -> Vec<&ResourceRef> {
        let primary = self.stage.required_kind();
        let (mut first, rest): (Vec<_>, Vec<_>) =
            self.resources.iter().partition(|r| r.kind == primary);
        first.extend(rest);
        first
    }
}

fn match_labels(deployment: &serde_yaml::Value) -> Option<String> {
    let labels = deployment
        .get("spec")?
        .get("selector")?
        .get("matchLabels")?
        .as_mapping()?;

    let pairs: Vec<String> = labels
        .iter()
        .filter_map(|(k, v)| Some(format!("{}={}", k.as_str()?, v.as_str()?)))
        .collect();
    (!pairs.is_empty()).then(|| pairs.join(","))
}

/// Secret, deployment and service manifests for one deployment of the chatbot
#[derive(Debug, Clone)]
pub struct ManifestSet {
    pub secret: Manifest,
    pub deployment: Manifest,
    pub service: Manifest,
}

impl ManifestSet {
    /// Read manifests from the configured directory, or generate them
    pub fn load(config: &Config, spec: &ImageSpec) -> Result<Self> {
        match &config.manifest_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::generate(config, spec),
        }
    }

    pub fn from_dir(dir: &Path) -> Result<Self> {
        info!("Loading manifests from {}", dir.display());
        let read = |stage: Stage| -> Result<Manifest> {
            let path = dir.join(stage.file_name());
            let yaml = std::fs::read_to_string(&path).map_err(|e| {
                DeployError::Manifest(format!("cannot read {}: {}", path.display(), e))
            })?;
            Manifest::parse(stage, yaml)
        };

        Ok(Self {
            secret: read(Stage::Secret)?,
            deployment: read(Stage::Deployment)?,
            service: read(Stage::Service)?,
        })
    }

    pub fn generate(config: &Config, spec: &ImageSpec) -> Result<Self> {
        debug!("Generating manifests for {}", config.app_name);

        let secret = serde_yaml::to_string(&secret(config))?;
        let deployment = format!(
            "{}---\n{}",
            serde_yaml::to_string(&config_map(config, spec))?,
            serde_yaml::to_string(&deployment(config, spec)?)?
        );
        let service = serde_yaml::to_string(&service(config, spec)?)?;

        Ok(Self {
            secret: Manifest::parse(Stage::Secret, secret)?,
            deployment: Manifest::parse(Stage::Deployment, deployment)?,
            service: Manifest::parse(Stage::Service, service)?,
        })
    }

    pub fn get(&self, stage: Stage) -> &Manifest {
        match stage {
            Stage::Secret => &self.secret,
            Stage::Deployment => &self.deployment,
            Stage::Service => &self.service,
        }
    }

    pub fn deployment_name(&self) -> &str {
        // Presence is checked by Manifest::parse
        self.deployment
            .find("Deployment")
            .map(|r| r.name.as_str())
            .unwrap_or_default()
    }

    /// Selector matching the deployment's pods, when the manifest declares one
    pub fn pod_selector(&self) -> Option<&str> {
        self.deployment.pod_selector.as_deref()
    }

    pub fn service_name(&self) -> &str {
        self.service
            .find("Service")
            .map(|r| r.name.as_str())
            .unwrap_or_default()
    }

    /// All manifests as one YAML stream, in apply order, with secret values masked
    pub fn render(&self) -> Result<String> {
        let mut sections = Vec::new();
        for stage in Stage::APPLY_ORDER {
            let yaml = match stage {
                Stage::Secret => redact_secrets(&self.secret.yaml)?,
                _ => self.get(stage).yaml.clone(),
            };
            sections.push(format!("# {}\n{}", stage.file_name(), yaml.trim_end()));
        }
        Ok(sections.join("\n---\n") + "\n")
    }
}

const REDACTED: &str = "<redacted>";

/// Replace every value under `data` and `stringData` of Secret documents
fn redact_secrets(yaml: &str) -> Result<String> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(yaml) {
        let mut value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        if value.get("kind").and_then(|k| k.as_str()) == Some("Secret") {
            for field in ["data", "stringData"] {
                if let Some(entries) = value.get_mut(field).and_then(|d| d.as_mapping_mut()) {
                    for (_, entry) in entries.iter_mut() {
                        *entry = serde_yaml::Value::String(REDACTED.to_string());
                    }
                }
            }
        }
        documents.push(serde_yaml::to_string(&value)?);
    }
    Ok(documents.join("---\n"))
}

/// Labels the service and deployment use to find the pods
fn selector(config: &Config) -> BTreeMap<String, String> {
    BTreeMap::from([(resources::APP_LABEL.to_string(), config.app_name.clone())])
}

fn labels(config: &Config) -> BTreeMap<String, String> {
    let mut labels = selector(config);
    labels.insert(
        resources::MANAGED_BY_LABEL.to_string(),
        resources::MANAGER_NAME.to_string(),
    );
    labels
}

fn metadata(config: &Config, name: String) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: Some(config.namespace.clone()),
        labels: Some(labels(config)),
        ..Default::default()
    }
}

fn secret(config: &Config) -> Secret {
    Secret {
        metadata: metadata(config, config.secret_name()),
        type_: Some("Opaque".to_string()),
        string_data: Some(config.secret_data.clone()),
        ..Default::default()
    }
}

fn config_map(config: &Config, spec: &ImageSpec) -> ConfigMap {
    let data = spec
        .environment()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    ConfigMap {
        metadata: metadata(config, config.config_map_name()),
        data: Some(data),
        ..Default::default()
    }
}

fn deployment(config: &Config, spec: &ImageSpec) -> Result<Deployment> {
    let hc = &spec.health_check;
    let probe = |initial_delay: u64| {
        json!({
            "httpGet": { "path": hc.path, "port": "http" },
            "initialDelaySeconds": initial_delay,
            "periodSeconds": hc.interval.as_secs(),
            "timeoutSeconds": hc.timeout.as_secs(),
            "failureThreshold": hc.retries,
        })
    };

    let deployment = json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": metadata(config, config.app_name.clone()),
        "spec": {
            "replicas": 1,
            "selector": { "matchLabels": selector(config) },
            "template": {
                "metadata": { "labels": labels(config) },
                "spec": {
                    "securityContext": {
                        "runAsNonRoot": true,
                        "runAsUser": spec.uid,
                    },
                    "containers": [{
                        "name": config.app_name,
                        "image": config.image.reference(),
                        "imagePullPolicy": "IfNotPresent",
                        "ports": [{ "name": "http", "containerPort": spec.port }],
                        "envFrom": [
                            { "configMapRef": { "name": config.config_map_name() } },
                            { "secretRef": { "name": config.secret_name() } },
                        ],
                        "livenessProbe": probe(hc.start_period.as_secs()),
                        "readinessProbe": probe(hc.start_period.as_secs()),
                    }],
                },
            },
        },
    });

    Ok(serde_json::from_value(deployment)?)
}

fn service(config: &Config, spec: &ImageSpec) -> Result<Service> {
    let mut port = json!({
        "name": "http",
        "port": resources::SERVICE_PORT,
        "targetPort": spec.port,
        "protocol": "TCP",
    });
    if let Some(node_port) = config.node_port {
        port["nodePort"] = json!(node_port);
    }

    let service = json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": metadata(config, config.app_name.clone()),
        "spec": {
            "type": "NodePort",
            "selector": selector(config),
            "ports": [port],
        },
    });

    Ok(serde_json::from_value(service)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated() -> ManifestSet {
        let mut config = Config::default();
        config
            .secret_data
            .insert("ANTHROPIC_API_KEY".to_string(), "sk-test".to_string());
        ManifestSet::generate(&config, &ImageSpec::default()).unwrap()
    }

    #[test]
    fn test_generated_resources() {
        let set = generated();

        assert_eq!(
            set.secret.resources,
            vec![ResourceRef::new("Secret", "devops-chatbot-secrets")]
        );
        assert_eq!(
            set.deployment.resources,
            vec![
                ResourceRef::new("ConfigMap", "devops-chatbot-config"),
                ResourceRef::new("Deployment", "devops-chatbot"),
            ]
        );
        assert_eq!(
            set.service.resources,
            vec![ResourceRef::new("Service", "devops-chatbot")]
        );
        assert_eq!(set.deployment_name(), "devops-chatbot");
        assert_eq!(set.service_name(), "devops-chatbot");
    }

    #[test]
    fn test_generated_secret_carries_values() {
        let set = generated();
        let secret: Secret = serde_yaml::from_str(&set.secret.yaml).unwrap();

        assert_eq!(secret.type_.as_deref(), Some("Opaque"));
        assert_eq!(
            secret.string_data.unwrap().get("ANTHROPIC_API_KEY").map(String::as_str),
            Some("sk-test")
        );
    }

    #[test]
    fn test_generated_deployment_references_secret_and_config() {
        let set = generated();
        let yaml = &set.deployment.yaml;

        assert!(yaml.contains("image: devops-chatbot:latest"));
        assert!(yaml.contains("name: devops-chatbot-secrets"));
        assert!(yaml.contains("name: devops-chatbot-config"));
        assert!(yaml.contains("path: /api/health"));
        assert!(yaml.contains("periodSeconds: 30"));
        assert!(yaml.contains("failureThreshold: 3"));
    }

    #[test]
    fn test_generated_service_is_node_port() {
        let config = Config {
            node_port: Some(30080),
            ..Default::default()
        };
        let set = ManifestSet::generate(&config, &ImageSpec::default()).unwrap();
        let service: Service = serde_yaml::from_str(&set.service.yaml).unwrap();
        let spec = service.spec.unwrap();

        assert_eq!(spec.type_.as_deref(), Some("NodePort"));
        let port = &spec.ports.unwrap()[0];
        assert_eq!(port.port, 80);
        assert_eq!(port.node_port, Some(30080));
    }

    #[test]
    fn test_parse_rejects_missing_required_kind() {
        let yaml = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: only-config\n";
        let err = Manifest::parse(Stage::Deployment, yaml.to_string()).unwrap_err();
        assert!(err.to_string().contains("does not declare a Deployment"));
    }

    #[test]
    fn test_parse_rejects_unnamed_object() {
        let yaml = "apiVersion: v1\nkind: Secret\nmetadata: {}\n";
        assert!(Manifest::parse(Stage::Secret, yaml.to_string()).is_err());
    }

    #[test]
    fn test_parse_skips_empty_documents() {
        let yaml = "---\napiVersion: v1\nkind: Service\nmetadata:\n  name: web\n---\n";
        let manifest = Manifest::parse(Stage::Service, yaml.to_string()).unwrap();
        assert_eq!(manifest.resources, vec![ResourceRef::new("Service", "web")]);
    }

    #[test]
    fn test_removal_order_puts_primary_kind_first() {
        let set = generated();
        let order: Vec<String> = set
            .deployment
            .removal_order()
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(
            order,
            vec!["deployment/devops-chatbot", "configmap/devops-chatbot-config"]
        );
    }

    #[test]
    fn test_from_dir_reads_all_three_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("secret.yaml"),
            "apiVersion: v1\nkind: Secret\nmetadata:\n  name: chatbot-secrets\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("deployment.yaml"),
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: chatbot\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("service.yaml"),
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: chatbot-svc\n",
        )
        .unwrap();

        let set = ManifestSet::from_dir(dir.path()).unwrap();

        assert_eq!(set.deployment_name(), "chatbot");
        assert_eq!(set.service_name(), "chatbot-svc");
    }

    #[test]
    fn test_render_masks_secret_values() {
        let set = generated();

        let rendered = set.render().unwrap();

        assert!(!rendered.contains("sk-test"));
        assert!(rendered.contains("ANTHROPIC_API_KEY:"));
        assert!(rendered.contains(REDACTED));
        // The applied manifest keeps the real value
        assert!(set.secret.yaml.contains("sk-test"));
    }

    #[test]
    fn test_render_masks_base64_data_from_files() {
        let yaml = "apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\ndata:\n  DB_PASSWORD: aHVudGVyMg==\n";

        let redacted = redact_secrets(yaml).unwrap();

        assert!(!redacted.contains("aHVudGVyMg=="));
        assert!(redacted.contains("DB_PASSWORD:"));
        assert!(redacted.contains(REDACTED));
        assert!(redacted.contains("name: s"));
    }

    #[test]
    fn test_pod_selector_from_match_labels() {
        let yaml = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: custom\n\
                    spec:\n  selector:\n    matchLabels:\n      app: custom\n      tier: web\n";

        let manifest = Manifest::parse(Stage::Deployment, yaml.to_string()).unwrap();

        assert_eq!(manifest.pod_selector.as_deref(), Some("app=custom,tier=web"));
    }

    #[test]
    fn test_pod_selector_of_generated_deployment() {
        assert_eq!(generated().pod_selector(), Some("app=devops-chatbot"));
    }

    #[test]
    fn test_from_dir_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManifestSet::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("secret.yaml"));
    }

    #[test]
    fn test_render_lists_manifests_in_apply_order() {
        let rendered = generated().render().unwrap();
        let secret = rendered.find("# secret.yaml").unwrap();
        let deployment = rendered.find("# deployment.yaml").unwrap();
        let service = rendered.find("# service.yaml").unwrap();
        assert!(secret < deployment && deployment < service);
    }
}
