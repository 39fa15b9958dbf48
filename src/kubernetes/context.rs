// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Which cluster context kubectl will act on

use crate::config::Config;
use crate::error::{DeployError, Result};
use kube::config::Kubeconfig;
use tracing::debug;

/// The explicit `--kube-context` override, or the kubeconfig's current context
pub fn target_context(config: &Config) -> Option<String> {
    if let Some(context) = &config.kube_context {
        return Some(context.clone());
    }

    match Kubeconfig::read() {
        Ok(kubeconfig) => kubeconfig.current_context,
        Err(e) => {
            // kubectl reports its own, more useful, error if it cannot connect
            debug!("Could not read kubeconfig: {}", e);
            None
        }
    }
}

/// Current context named in a kubeconfig document
pub fn current_context_from_str(kubeconfig: &str) -> Result<Option<String>> {
    let parsed: Kubeconfig = serde_yaml::from_str(kubeconfig)
        .map_err(|e| DeployError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))?;
    Ok(parsed.current_context)
}
