// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command dispatch: build, deploy, delete, status, and their composition.
//!
//! Mutating commands (build, deploy) stop at the first failing step and leave
//! whatever was already applied in place. Teardown and inspection visit every
//! resource and report absence as a normal outcome.

pub mod report;

use crate::config::Config;
use crate::error::Result;
use crate::health::{self, HealthReport};
use crate::image::{ImageBuilder, ImageSpec};
use crate::kubernetes::{target_context, Kubectl, Lookup, ManifestSet, Removal, Stage};
use crate::process::CommandRunner;
use tracing::{error, info, instrument, warn};

pub use report::{
    DeploySummary, StatusOutcome, StatusReport, StatusSection, TeardownOutcome, TeardownReport,
};

/// One dispatcher invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Build,
    Deploy,
    Delete,
    Status,
    /// Build, then deploy
    All,
}

pub struct Orchestrator<R> {
    config: Config,
    spec: ImageSpec,
    runner: R,
}

impl<R> Orchestrator<R>
where
    R: CommandRunner,
{
    pub fn new(config: Config, runner: R) -> Self {
        Self {
            config,
            spec: ImageSpec::default(),
            runner,
        }
    }

    pub fn with_spec(mut self, spec: ImageSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn kubectl(&self) -> Kubectl<'_, R> {
        Kubectl::new(&self.runner, &self.config)
    }

    /// Run one action and print its result to stdout
    pub async fn run(&self, action: Action) -> Result<()> {
        match action {
            Action::Build => {
                let image = self.build().await?;
                println!("Image {} is ready", image);
            }
            Action::Deploy => {
                println!("{}", self.deploy().await?);
            }
            Action::Delete => {
                let report = self.delete().await?;
                print!("{}", report);
                report.into_result()?;
            }
            Action::Status => {
                let report = self.status().await?;
                print!("{}", report);
                report.into_result()?;
            }
            Action::All => {
                let image = self.build().await?;
                println!("Image {} is ready", image);
                println!("{}", self.deploy().await?);
            }
        }
        Ok(())
    }

    pub async fn build(&self) -> Result<String> {
        ImageBuilder::new(&self.runner, &self.config)
            .with_spec(self.spec.clone())
            .build()
            .await
    }

    /// Apply secret, deployment and service in that order, wait for the rollout,
    /// and work out where the service can be reached
    #[instrument(skip(self), fields(namespace = %self.config.namespace))]
    pub async fn deploy(&self) -> Result<DeploySummary> {
        let kubectl = self.kubectl();
        kubectl.ensure_installed()?;

        match target_context(&self.config) {
            Some(context) => info!("Deploying to context '{}'", context),
            None => info!("Deploying with kubectl's default context"),
        }

        self.config.warn_missing_secrets();
        let manifests = ManifestSet::load(&self.config, &self.spec)?;

        for stage in Stage::APPLY_ORDER {
            info!("Applying {} manifest...", stage);
            kubectl.apply(manifests.get(stage)).await?;
        }

        let deployment = manifests.deployment_name().to_string();
        let service = manifests.service_name().to_string();

        info!("Waiting for deployment {} to roll out...", deployment);
        kubectl
            .rollout_status(&deployment, self.config.rollout_timeout)
            .await?;

        let access_url = kubectl
            .node_port(&service)
            .await?
            .map(|port| format!("http://{}:{}", self.config.access_host, port));

        Ok(DeploySummary {
            deployment,
            service,
            namespace: self.config.namespace.clone(),
            access_url,
        })
    }

    /// Remove service, deployment and secret in that order. Every object is
    /// attempted; absent ones are reported as not found.
    #[instrument(skip(self), fields(namespace = %self.config.namespace))]
    pub async fn delete(&self) -> Result<TeardownReport> {
        let kubectl = self.kubectl();
        kubectl.ensure_installed()?;
        let manifests = ManifestSet::load(&self.config, &self.spec)?;

        let mut report = TeardownReport::default();
        for stage in Stage::DELETE_ORDER {
            info!("Removing {} resources...", stage);
            for resource in manifests.get(stage).removal_order() {
                let outcome = match kubectl.delete(resource).await {
                    Ok(Removal::Deleted) => TeardownOutcome::Deleted,
                    Ok(Removal::NotFound) => TeardownOutcome::NotFound,
                    Err(e) => {
                        error!("Failed to delete {}: {}", resource, e);
                        TeardownOutcome::Failed(e.to_string())
                    }
                };
                report.entries.push((resource.clone(), outcome));
            }
        }

        Ok(report)
    }

    /// Read-only view of the deployment, its pods and the service
    #[instrument(skip(self), fields(namespace = %self.config.namespace))]
    pub async fn status(&self) -> Result<StatusReport> {
        let kubectl = self.kubectl();
        kubectl.ensure_installed()?;

        if let Some(context) = target_context(&self.config) {
            info!("Cluster context: {}", context);
        }

        let manifests = ManifestSet::load(&self.config, &self.spec)?;
        let deployment = manifests.deployment_name().to_string();
        let service = manifests.service_name().to_string();
        let selector = match manifests.pod_selector() {
            Some(selector) => selector.to_string(),
            None => format!(
                "{}={}",
                crate::constants::resources::APP_LABEL,
                self.config.app_name
            ),
        };

        let lookups = [
            ("Deployment", deployment.clone(), kubectl.get("deployment", &deployment).await),
            ("Pods", selector.clone(), kubectl.get_selected("pods", &selector).await),
            ("Service", service.clone(), kubectl.get("service", &service).await),
        ];

        let sections = lookups
            .into_iter()
            .map(|(title, target, lookup)| {
                let outcome = match lookup {
                    Ok(Lookup::Found(table)) => StatusOutcome::Found(table),
                    Ok(Lookup::NotFound) => StatusOutcome::NotFound,
                    Err(e) => {
                        warn!("Failed to query {} {}: {}", title, target, e);
                        StatusOutcome::Failed(e.to_string())
                    }
                };
                StatusSection {
                    title,
                    target,
                    outcome,
                }
            })
            .collect();

        Ok(StatusReport { sections })
    }

    /// Probe the chatbot's health endpoint. Without an explicit base URL the
    /// service's node port is looked up first.
    pub async fn health(&self, base_url: Option<String>) -> Result<HealthReport> {
        let base = match base_url {
            Some(url) => url,
            None => {
                let kubectl = self.kubectl();
                kubectl.ensure_installed()?;
                let manifests = ManifestSet::load(&self.config, &self.spec)?;
                let service = manifests.service_name();
                let port = kubectl.node_port(service).await?.ok_or_else(|| {
                    crate::error::DeployError::HealthCheckFailed(format!(
                        "service {} has no node port; pass --url",
                        service
                    ))
                })?;
                format!("http://{}:{}", self.config.access_host, port)
            }
        };

        let url = health::health_url(&base, &self.spec.health_check.path)?;
        info!("Checking {}", url);
        health::probe(&url, self.spec.health_check.timeout).await
    }
}
