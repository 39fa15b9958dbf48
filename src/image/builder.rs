// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Builds the runtime image with the docker CLI

use crate::config::Config;
use crate::error::{DeployError, Result};
use crate::image::ImageSpec;
use crate::process::{require_tool, CommandRunner, Invocation};
use tracing::{info, instrument};

const DOCKER_HINT: &str = "Install Docker (https://docs.docker.com/get-docker/) and make sure the daemon is running.";

/// Single-attempt image build against the configured build context
pub struct ImageBuilder<'a, R: ?Sized> {
    runner: &'a R,
    config: &'a Config,
    spec: ImageSpec,
}

impl<'a, R> ImageBuilder<'a, R>
where
    R: CommandRunner + ?Sized,
{
    pub fn new(runner: &'a R, config: &'a Config) -> Self {
        Self {
            runner,
            config,
            spec: ImageSpec::default(),
        }
    }

    pub fn with_spec(mut self, spec: ImageSpec) -> Self {
        self.spec = spec;
        self
    }

    /// The docker invocation for this build. Uses the Dockerfile in the build
    /// context when there is one, otherwise pipes the rendered description on stdin.
    pub fn invocation(&self) -> Result<Invocation> {
        let image = self.config.image.reference();
        let context = self.config.build_context.display().to_string();
        let base = Invocation::new(&self.config.docker_bin).args(["build", "-t", image.as_str()]);

        let invocation = match self.config.resolved_dockerfile() {
            Some(path) => base
                .arg("-f")
                .arg(path.display().to_string())
                .arg(context),
            None => {
                info!("No Dockerfile in {}, using the generated build description", context);
                base.args(["-f", "-"]).arg(context).stdin(self.spec.render()?)
            }
        };
        Ok(invocation.streaming())
    }

    /// Build and tag the image, returning its `name:tag` reference
    #[instrument(skip(self), fields(image = %self.config.image.reference()))]
    pub async fn build(&self) -> Result<String> {
        require_tool(self.runner, &self.config.docker_bin, DOCKER_HINT)?;

        if !self.config.build_context.is_dir() {
            return Err(DeployError::MissingBuildContext(
                self.config.build_context.clone(),
            ));
        }

        let image = self.config.image.reference();
        let invocation = self.invocation()?;

        info!("Building image {}...", image);
        self.runner.run(&invocation).await?.check(&invocation)?;
        info!("Image {} built successfully", image);

        Ok(image)
    }
}
