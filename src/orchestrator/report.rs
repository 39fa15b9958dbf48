// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Human-readable results of deploy, delete and status

use crate::error::{DeployError, Result};
use crate::kubernetes::ResourceRef;
use std::fmt;

/// Outcome of a deploy run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySummary {
    pub deployment: String,
    pub service: String,
    pub namespace: String,
    /// `None` when the service has no node port (e.g. ClusterIP or LoadBalancer)
    pub access_url: Option<String>,
}

impl fmt::Display for DeploySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deployment {} is rolled out in namespace {}",
            self.deployment, self.namespace
        )?;
        match &self.access_url {
            Some(url) => write!(f, "Access the chatbot at: {}", url),
            None => write!(
                f,
                "Service {} exposes no node port; try: kubectl port-forward -n {} service/{} 8080:80",
                self.service, self.namespace, self.service
            ),
        }
    }
}

/// What happened to one object during teardown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownOutcome {
    Deleted,
    NotFound,
    Failed(String),
}

/// Per-object results of a delete run, in removal order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub entries: Vec<(ResourceRef, TeardownOutcome)>,
}

impl TeardownReport {
    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| matches!(outcome, TeardownOutcome::Failed(_)))
            .count()
    }

    /// Ok unless a removal failed for a reason other than absence
    pub fn into_result(self) -> Result<Self> {
        match self.failures() {
            0 => Ok(self),
            failures => Err(DeployError::Incomplete {
                operation: "delete",
                failures,
            }),
        }
    }
}

impl fmt::Display for TeardownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (resource, outcome) in &self.entries {
            match outcome {
                TeardownOutcome::Deleted => writeln!(f, "{} deleted", resource)?,
                TeardownOutcome::NotFound => writeln!(f, "{} not found", resource)?,
                TeardownOutcome::Failed(reason) => {
                    writeln!(f, "{} could not be deleted: {}", resource, reason)?
                }
            }
        }
        Ok(())
    }
}

/// State of one resource group as reported by kubectl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Found(String),
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSection {
    /// "Deployment", "Pods" or "Service"
    pub title: &'static str,
    /// What was looked up, e.g. the object name or label selector
    pub target: String,
    pub outcome: StatusOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub sections: Vec<StatusSection>,
}

impl StatusReport {
    pub fn failures(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| matches!(s.outcome, StatusOutcome::Failed(_)))
            .count()
    }

    pub fn into_result(self) -> Result<Self> {
        match self.failures() {
            0 => Ok(self),
            failures => Err(DeployError::Incomplete {
                operation: "status",
                failures,
            }),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            match &section.outcome {
                StatusOutcome::Found(table) => {
                    writeln!(f, "=== {} ===", section.title)?;
                    writeln!(f, "{}", table)?;
                }
                StatusOutcome::NotFound => {
                    writeln!(f, "{} {} not found", section.title, section.target)?
                }
                StatusOutcome::Failed(reason) => writeln!(
                    f,
                    "{} {} could not be queried: {}",
                    section.title, section.target, reason
                )?,
            }
        }
        Ok(())
    }
}
