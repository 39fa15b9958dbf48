// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! HTTP probe against the chatbot's health endpoint

use crate::error::{DeployError, Result};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Body served by the chatbot at its health endpoint
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub agents_loaded: Option<u64>,
    #[serde(default)]
    pub model: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status: {}", self.status)?;
        if let Some(version) = &self.version {
            write!(f, ", version: {}", version)?;
        }
        if let Some(agents) = self.agents_loaded {
            write!(f, ", agents loaded: {}", agents)?;
        }
        if let Some(model) = &self.model {
            write!(f, ", model: {}", model)?;
        }
        Ok(())
    }
}

/// Resolve the health endpoint against the service's base URL
pub fn health_url(base: &str, path: &str) -> Result<Url> {
    let base = Url::parse(base)
        .map_err(|e| DeployError::HealthCheckFailed(format!("invalid URL '{}': {}", base, e)))?;
    base.join(path)
        .map_err(|e| DeployError::HealthCheckFailed(format!("invalid path '{}': {}", path, e)))
}

/// Single GET against the health endpoint; no retries
#[instrument(skip(url, timeout), fields(url = %url))]
pub async fn probe(url: &Url, timeout: Duration) -> Result<HealthReport> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .no_proxy()
        .build()?;

    debug!("Probing {}", url);
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DeployError::HealthCheckFailed(format!(
            "{} returned {}",
            url, status
        )));
    }

    let report: HealthReport = response.json().await?;
    if !report.is_healthy() {
        return Err(DeployError::HealthCheckFailed(format!(
            "{} reported status '{}'",
            url, report.status
        )));
    }

    Ok(report)
}
