// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("`{tool}` is not installed or not on PATH. {hint}")]
    ToolNotFound { tool: String, hint: &'static str },

    #[error("Build context {0} does not exist or is not a directory")]
    MissingBuildContext(PathBuf),

    #[error("Invalid health check: {0}")]
    InvalidHealthCheck(String),

    #[error("`{command}` failed with {}: {stderr}", exit_description(*.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Failed to parse manifest YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to build manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to render build description: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("Failed to read kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} incomplete: {failures} step(s) failed")]
    Incomplete {
        operation: &'static str,
        failures: usize,
    },
}

fn exit_description(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
