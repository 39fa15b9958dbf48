// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command-line surface

use crate::config::Config;
use crate::orchestrator::Action;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "chatbot-deploy")]
#[command(about = "Build and deploy the DevOps multi-agent chatbot", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Defaults to `all` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Build the container image
    Build,

    /// Apply secret, deployment and service, then wait for the rollout
    Deploy,

    /// Remove service, deployment and secret
    Delete,

    /// Show deployment, pod and service state
    Status,

    /// Build the image, then deploy it
    All,

    /// Probe the chatbot's health endpoint
    Health {
        /// Base URL of the chatbot; looked up from the service's node port when omitted
        #[arg(long)]
        url: Option<String>,
    },

    /// Print the generated build description or manifests; secret values are masked
    Render {
        #[arg(value_enum)]
        target: RenderTarget,
    },
}

impl Commands {
    /// The dispatcher action behind this subcommand, if it is one
    pub fn action(&self) -> Option<Action> {
        match self {
            Commands::Build => Some(Action::Build),
            Commands::Deploy => Some(Action::Deploy),
            Commands::Delete => Some(Action::Delete),
            Commands::Status => Some(Action::Status),
            Commands::All => Some(Action::All),
            Commands::Health { .. } | Commands::Render { .. } => None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    Dockerfile,
    Manifests,
}

/// Flags that take precedence over the environment
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Image name [env: CHATBOT_IMAGE_NAME]
    #[arg(long, global = true)]
    pub image_name: Option<String>,

    /// Image tag [env: CHATBOT_IMAGE_TAG]
    #[arg(long, global = true)]
    pub image_tag: Option<String>,

    /// Deployment and service name [env: CHATBOT_APP_NAME]
    #[arg(long, global = true)]
    pub app_name: Option<String>,

    /// Target namespace [env: CHATBOT_NAMESPACE]
    #[arg(long, short = 'n', global = true)]
    pub namespace: Option<String>,

    /// kubectl context [env: CHATBOT_KUBE_CONTEXT]
    #[arg(long, global = true)]
    pub kube_context: Option<String>,

    /// Docker build context directory [env: CHATBOT_BUILD_CONTEXT]
    #[arg(long, global = true)]
    pub build_context: Option<PathBuf>,

    /// Dockerfile to build with [env: CHATBOT_DOCKERFILE]
    #[arg(long, global = true)]
    pub dockerfile: Option<PathBuf>,

    /// Directory with secret.yaml, deployment.yaml and service.yaml [env: CHATBOT_MANIFEST_DIR]
    #[arg(long, global = true)]
    pub manifest_dir: Option<PathBuf>,

    /// Give up waiting for the rollout after this many seconds [env: CHATBOT_ROLLOUT_TIMEOUT_SECS]
    #[arg(long, global = true)]
    pub rollout_timeout_secs: Option<u64>,

    /// Host printed in the access URL [env: CHATBOT_ACCESS_HOST]
    #[arg(long, global = true)]
    pub access_host: Option<String>,

    /// Fixed node port for the generated service [env: CHATBOT_NODE_PORT]
    #[arg(long, global = true)]
    pub node_port: Option<u16>,
}

impl Overrides {
    pub fn apply(self, config: &mut Config) {
        if let Some(name) = self.image_name {
            config.image.name = name;
        }
        if let Some(tag) = self.image_tag {
            config.image.tag = tag;
        }
        if let Some(app_name) = self.app_name {
            config.app_name = app_name;
        }
        if let Some(namespace) = self.namespace {
            config.namespace = namespace;
        }
        if self.kube_context.is_some() {
            config.kube_context = self.kube_context;
        }
        if let Some(dir) = self.build_context {
            config.build_context = dir;
        }
        if self.dockerfile.is_some() {
            config.dockerfile = self.dockerfile;
        }
        if self.manifest_dir.is_some() {
            config.manifest_dir = self.manifest_dir;
        }
        if let Some(secs) = self.rollout_timeout_secs {
            config.rollout_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(host) = self.access_host {
            config.access_host = host;
        }
        if self.node_port.is_some() {
            config.node_port = self.node_port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_all() {
        let cli = Cli::try_parse_from(["chatbot-deploy"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(
            cli.command.unwrap_or(Commands::All).action(),
            Some(Action::All)
        );
    }

    #[test]
    fn test_subcommands_map_to_actions() {
        for (arg, action) in [
            ("build", Action::Build),
            ("deploy", Action::Deploy),
            ("delete", Action::Delete),
            ("status", Action::Status),
            ("all", Action::All),
        ] {
            let cli = Cli::try_parse_from(["chatbot-deploy", arg]).unwrap();
            assert_eq!(cli.command.unwrap().action(), Some(action));
        }
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        let err = Cli::try_parse_from(["chatbot-deploy", "destroy"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "chatbot-deploy",
            "deploy",
            "--namespace",
            "devops",
            "--rollout-timeout-secs",
            "180",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.overrides.apply(&mut config);

        assert_eq!(config.namespace, "devops");
        assert_eq!(config.rollout_timeout, Some(Duration::from_secs(180)));
    }

    #[test]
    fn test_flags_override_environment() {
        let mut config = Config {
            namespace: "from-env".to_string(),
            kube_context: Some("env-context".to_string()),
            ..Default::default()
        };
        let overrides = Overrides {
            namespace: Some("from-flag".to_string()),
            ..Default::default()
        };

        overrides.apply(&mut config);

        assert_eq!(config.namespace, "from-flag");
        assert_eq!(config.kube_context.as_deref(), Some("env-context"));
    }

    #[test]
    fn test_render_target() {
        let cli = Cli::try_parse_from(["chatbot-deploy", "render", "manifests"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Render {
                target: RenderTarget::Manifests
            })
        );
    }
}
