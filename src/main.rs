// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use chatbot_deploy::cli::{Cli, Commands, RenderTarget};
use chatbot_deploy::config::Config;
use chatbot_deploy::image::ImageSpec;
use chatbot_deploy::kubernetes::ManifestSet;
use chatbot_deploy::orchestrator::Orchestrator;
use chatbot_deploy::process::SystemRunner;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors exit 1; --help and --version are not errors
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let mut config = Config::from_env()?;
    cli.overrides.apply(&mut config);
    debug!("Configuration loaded: {:?}", config.image);

    let command = cli.command.unwrap_or(Commands::All);
    let orchestrator = Orchestrator::new(config, SystemRunner);

    match command {
        Commands::Health { url } => {
            let report = orchestrator.health(url).await?;
            println!("Chatbot is healthy ({})", report);
        }
        Commands::Render { target } => {
            let spec = ImageSpec::default();
            match target {
                RenderTarget::Dockerfile => print!("{}", spec.render()?),
                RenderTarget::Manifests => {
                    print!("{}", ManifestSet::load(orchestrator.config(), &spec)?.render()?)
                }
            }
        }
        dispatched => {
            if let Some(action) = dispatched.action() {
                orchestrator.run(action).await?;
            }
        }
    }

    Ok(())
}
