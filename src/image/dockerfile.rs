// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed two-stage build description for the chatbot runtime image

use crate::constants::{health, image};
use crate::error::{DeployError, Result};
use std::fmt::{self, Write};
use std::time::Duration;

/// Liveness probe embedded in the image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub path: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub start_period: Duration,
    /// Consecutive failures before the container is reported unhealthy
    pub retries: u32,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            path: health::PATH.to_string(),
            interval: Duration::from_secs(health::INTERVAL_SECS),
            timeout: Duration::from_secs(health::TIMEOUT_SECS),
            start_period: Duration::from_secs(health::START_PERIOD_SECS),
            retries: health::RETRIES,
        }
    }
}

impl HealthCheck {
    /// Reject schedules and endpoints the container runtime would misinterpret
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() || !self.path.starts_with('/') {
            return Err(DeployError::InvalidHealthCheck(format!(
                "endpoint path '{}' must start with '/'",
                self.path
            )));
        }
        if self.path.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
            return Err(DeployError::InvalidHealthCheck(format!(
                "endpoint path '{}' contains whitespace or quotes",
                self.path
            )));
        }
        if self.interval.is_zero() || self.timeout.is_zero() {
            return Err(DeployError::InvalidHealthCheck(
                "interval and timeout must be non-zero".to_string(),
            ));
        }
        if self.timeout > self.interval {
            return Err(DeployError::InvalidHealthCheck(format!(
                "timeout {}s exceeds interval {}s",
                self.timeout.as_secs(),
                self.interval.as_secs()
            )));
        }
        if self.retries == 0 {
            return Err(DeployError::InvalidHealthCheck(
                "retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Probe command run inside the container; the slim base image has no curl
    pub fn command(&self, port: u16) -> String {
        format!(
            "python -c \"import urllib.request; urllib.request.urlopen('http://localhost:{}{}', timeout={})\" || exit 1",
            port,
            self.path,
            self.timeout.as_secs()
        )
    }
}

/// Everything that varies between builds of the runtime image
#[derive(Debug, Clone)]
pub struct ImageSpec {
    pub base_image: String,
    pub build_packages: Vec<String>,
    pub venv_path: String,
    pub requirements_file: String,
    pub workdir: String,
    pub user: String,
    pub uid: u32,
    pub bind_host: String,
    pub port: u16,
    pub entrypoint_module: String,
    pub description: String,
    pub health_check: HealthCheck,
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self {
            base_image: image::BASE_IMAGE.to_string(),
            build_packages: image::BUILD_PACKAGES.iter().map(|p| p.to_string()).collect(),
            venv_path: image::VENV_PATH.to_string(),
            requirements_file: image::REQUIREMENTS_FILE.to_string(),
            workdir: image::WORKDIR.to_string(),
            user: image::RUNTIME_USER.to_string(),
            uid: image::RUNTIME_UID,
            bind_host: image::BIND_HOST.to_string(),
            port: image::PORT,
            entrypoint_module: image::ENTRYPOINT_MODULE.to_string(),
            description: image::DESCRIPTION.to_string(),
            health_check: HealthCheck::default(),
        }
    }
}

impl ImageSpec {
    /// Runtime environment defaults, overridable with `docker run -e`
    pub fn environment(&self) -> Vec<(&'static str, String)> {
        vec![
            ("PYTHONUNBUFFERED", "1".to_string()),
            ("PYTHONDONTWRITEBYTECODE", "1".to_string()),
            ("HOST", self.bind_host.clone()),
            ("PORT", self.port.to_string()),
        ]
    }

    /// Render the Dockerfile text
    pub fn render(&self) -> Result<String> {
        self.health_check.validate()?;

        let mut out = String::new();
        self.write_dockerfile(&mut out)?;
        Ok(out)
    }

    fn write_dockerfile(&self, out: &mut String) -> fmt::Result {
        let hc = &self.health_check;

        // Stage 1: dependency environment, compiler tooling stays behind
        writeln!(out, "FROM {} AS builder", self.base_image)?;
        writeln!(out, "WORKDIR /build")?;
        if !self.build_packages.is_empty() {
            writeln!(
                out,
                "RUN apt-get update \\\n    && apt-get install -y --no-install-recommends {} \\\n    && rm -rf /var/lib/apt/lists/*",
                self.build_packages.join(" ")
            )?;
        }
        writeln!(out, "RUN python -m venv {}", self.venv_path)?;
        writeln!(out, "ENV PATH=\"{}/bin:$PATH\"", self.venv_path)?;
        writeln!(out, "COPY {} .", self.requirements_file)?;
        writeln!(
            out,
            "RUN pip install --no-cache-dir --upgrade pip \\\n    && pip install --no-cache-dir -r {}",
            self.requirements_file
        )?;
        out.push('\n');

        // Stage 2: runtime
        writeln!(out, "FROM {}", self.base_image)?;
        writeln!(out, "LABEL description=\"{}\"", self.description)?;
        let env_line = self
            .environment()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" \\\n    ");
        writeln!(out, "ENV {} \\\n    PATH=\"{}/bin:$PATH\"", env_line, self.venv_path)?;
        writeln!(
            out,
            "RUN useradd --create-home --uid {} {}",
            self.uid, self.user
        )?;
        writeln!(out, "WORKDIR {}", self.workdir)?;
        writeln!(out, "COPY --from=builder {} {}", self.venv_path, self.venv_path)?;
        writeln!(out, "COPY --chown={}:{} . .", self.user, self.user)?;
        writeln!(out, "USER {}", self.user)?;
        writeln!(out, "EXPOSE {}", self.port)?;
        writeln!(
            out,
            "HEALTHCHECK --interval={}s --timeout={}s --start-period={}s --retries={} \\\n    CMD {}",
            hc.interval.as_secs(),
            hc.timeout.as_secs(),
            hc.start_period.as_secs(),
            hc.retries,
            hc.command(self.port)
        )?;
        writeln!(
            out,
            "CMD [\"sh\", \"-c\", \"uvicorn {} --host $HOST --port $PORT\"]",
            self.entrypoint_module
        )
    }
}
