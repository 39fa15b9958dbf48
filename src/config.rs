// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::constants::{defaults, env};

/// Name and tag of the runtime image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
    pub tag: String,
}

impl ImageRef {
    pub fn reference(&self) -> String {
        format!("{}:{}", self.name, self.tag)
    }
}

/// Everything the dispatcher needs to know about what to build and where to deploy it
#[derive(Debug, Clone)]
pub struct Config {
    pub image: ImageRef,
    /// Name of the deployment and service, also used as the `app` label
    pub app_name: String,
    pub namespace: String,
    /// Passed to kubectl as `--context` when set; otherwise kubectl's current context is used
    pub kube_context: Option<String>,
    pub build_context: PathBuf,
    /// Explicit build description; defaults to `<build_context>/Dockerfile` when that exists
    pub dockerfile: Option<PathBuf>,
    /// Directory holding secret.yaml, deployment.yaml and service.yaml.
    /// Manifests are generated when unset.
    pub manifest_dir: Option<PathBuf>,
    /// Forwarded to `kubectl rollout status --timeout`; kubectl's default when unset
    pub rollout_timeout: Option<Duration>,
    pub access_host: String,
    /// Fixed node port for the generated service; the cluster allocates one when unset
    pub node_port: Option<u16>,
    pub docker_bin: String,
    pub kubectl_bin: String,
    /// Values placed in the generated secret
    pub secret_data: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            image: ImageRef {
                name: defaults::IMAGE_NAME.to_string(),
                tag: defaults::IMAGE_TAG.to_string(),
            },
            app_name: defaults::APP_NAME.to_string(),
            namespace: defaults::NAMESPACE.to_string(),
            kube_context: None,
            build_context: PathBuf::from(defaults::BUILD_CONTEXT),
            dockerfile: None,
            manifest_dir: None,
            rollout_timeout: None,
            access_host: defaults::ACCESS_HOST.to_string(),
            node_port: None,
            docker_bin: defaults::DOCKER_BIN.to_string(),
            kubectl_bin: defaults::KUBECTL_BIN.to_string(),
            secret_data: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(name) = lookup(env::IMAGE_NAME) {
            config.image.name = name;
        }
        if let Some(tag) = lookup(env::IMAGE_TAG) {
            config.image.tag = tag;
        }
        if let Some(app_name) = lookup(env::APP_NAME) {
            config.app_name = app_name;
        }
        if let Some(namespace) = lookup(env::NAMESPACE) {
            config.namespace = namespace;
        }
        config.kube_context = lookup(env::KUBE_CONTEXT);
        if let Some(dir) = lookup(env::BUILD_CONTEXT) {
            config.build_context = PathBuf::from(dir);
        }
        config.dockerfile = lookup(env::DOCKERFILE).map(PathBuf::from);
        config.manifest_dir = lookup(env::MANIFEST_DIR).map(PathBuf::from);

        if let Some(secs) = lookup(env::ROLLOUT_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().with_context(|| {
                format!("{} must be a whole number of seconds, got '{}'", env::ROLLOUT_TIMEOUT_SECS, secs)
            })?;
            config.rollout_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(host) = lookup(env::ACCESS_HOST) {
            config.access_host = host;
        }
        if let Some(port) = lookup(env::NODE_PORT) {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("{} must be a port number, got '{}'", env::NODE_PORT, port))?;
            config.node_port = Some(port);
        }
        if let Some(bin) = lookup(env::DOCKER_BIN) {
            config.docker_bin = bin;
        }
        if let Some(bin) = lookup(env::KUBECTL_BIN) {
            config.kubectl_bin = bin;
        }

        for key in env::SECRET_KEYS {
            if let Some(value) = lookup(*key) {
                config.secret_data.insert((*key).to_string(), value);
            }
        }

        Ok(config)
    }

    /// Warn about secret values the application needs but that were not provided
    pub fn warn_missing_secrets(&self) {
        if self.manifest_dir.is_none() && !self.secret_data.contains_key(env::REQUIRED_SECRET_KEY) {
            warn!(
                "{} is not set; the generated secret will not contain it",
                env::REQUIRED_SECRET_KEY
            );
        }
    }

    pub fn secret_name(&self) -> String {
        format!("{}{}", self.app_name, crate::constants::resources::SECRET_SUFFIX)
    }

    pub fn config_map_name(&self) -> String {
        format!("{}{}", self.app_name, crate::constants::resources::CONFIG_SUFFIX)
    }

    /// The build description used when none is configured explicitly
    pub fn resolved_dockerfile(&self) -> Option<PathBuf> {
        match &self.dockerfile {
            Some(path) => Some(path.clone()),
            None => {
                let candidate = self.build_context.join("Dockerfile");
                candidate.is_file().then_some(candidate)
            }
        }
    }
}
