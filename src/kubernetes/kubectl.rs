// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Thin typed wrapper over the kubectl CLI

use crate::config::Config;
use crate::error::Result;
use crate::kubernetes::manifests::{Manifest, ResourceRef};
use crate::process::{require_tool, CommandRunner, Invocation};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const KUBECTL_HINT: &str =
    "Install kubectl (https://kubernetes.io/docs/tasks/tools/) and configure access to your cluster.";

/// Result of removing an object that may not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Deleted,
    NotFound,
}

/// Result of reading objects that may not exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// kubectl's table output
    Found(String),
    NotFound,
}

/// kubectl bound to one namespace and, optionally, one context
pub struct Kubectl<'a, R: ?Sized> {
    runner: &'a R,
    program: String,
    namespace: String,
    context: Option<String>,
}

impl<'a, R> Kubectl<'a, R>
where
    R: CommandRunner + ?Sized,
{
    pub fn new(runner: &'a R, config: &Config) -> Self {
        Self {
            runner,
            program: config.kubectl_bin.clone(),
            namespace: config.namespace.clone(),
            context: config.kube_context.clone(),
        }
    }

    pub fn ensure_installed(&self) -> Result<PathBuf> {
        require_tool(self.runner, &self.program, KUBECTL_HINT)
    }

    fn invocation<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invocation = Invocation::new(&self.program)
            .args(args)
            .args(["--namespace", self.namespace.as_str()]);
        match &self.context {
            Some(context) => invocation.args(["--context", context.as_str()]),
            None => invocation,
        }
    }

    /// `kubectl apply` the manifest from stdin; idempotent on the cluster side
    #[instrument(skip(self, manifest), fields(stage = %manifest.stage))]
    pub async fn apply(&self, manifest: &Manifest) -> Result<()> {
        let invocation = self.invocation(["apply", "-f", "-"]).stdin(manifest.yaml.as_str());
        let output = self.runner.run(&invocation).await?.check(&invocation)?;
        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            info!("{}", line.trim());
        }
        Ok(())
    }

    /// Delete one object; a missing object is reported, not raised.
    ///
    /// With `--ignore-not-found` kubectl exits 0 and prints nothing when the
    /// object is absent, so any non-zero exit is a genuine failure.
    #[instrument(skip(self, resource), fields(resource = %resource))]
    pub async fn delete(&self, resource: &ResourceRef) -> Result<Removal> {
        let invocation = self.invocation([
            "delete",
            resource.kubectl_type().as_str(),
            resource.name.as_str(),
            "--ignore-not-found",
        ]);
        let output = self.runner.run(&invocation).await?;

        if !output.success() && is_server_not_found(&output.stderr) {
            debug!("{} disappeared while deleting", resource);
            return Ok(Removal::NotFound);
        }
        let output = output.check(&invocation)?;

        if output.stdout.trim().is_empty() {
            debug!("{} was already absent", resource);
            Ok(Removal::NotFound)
        } else {
            debug!("Deleted {}", resource);
            Ok(Removal::Deleted)
        }
    }

    /// `kubectl get <type> <name>`
    #[instrument(skip(self))]
    pub async fn get(&self, resource_type: &str, name: &str) -> Result<Lookup> {
        let invocation =
            self.invocation(["get", resource_type, name, "-o", "wide", "--ignore-not-found"]);
        self.lookup(invocation).await
    }

    /// `kubectl get <type> -l <selector>`
    #[instrument(skip(self))]
    pub async fn get_selected(&self, resource_type: &str, selector: &str) -> Result<Lookup> {
        let invocation = self.invocation(["get", resource_type, "-l", selector, "-o", "wide"]);
        self.lookup(invocation).await
    }

    async fn lookup(&self, invocation: Invocation) -> Result<Lookup> {
        let output = self.runner.run(&invocation).await?;
        if !output.success() && is_server_not_found(&output.stderr) {
            return Ok(Lookup::NotFound);
        }
        let output = output.check(&invocation)?;

        // Missing names (with --ignore-not-found) and empty selections exit 0 with no table
        if output.stdout.trim().is_empty() {
            Ok(Lookup::NotFound)
        } else {
            Ok(Lookup::Found(output.stdout.trim_end().to_string()))
        }
    }

    /// Block until the deployment has rolled out, or kubectl gives up
    #[instrument(skip(self))]
    pub async fn rollout_status(&self, deployment: &str, timeout: Option<Duration>) -> Result<()> {
        let target = format!("deployment/{}", deployment);
        let mut args = vec!["rollout".to_string(), "status".to_string(), target];
        if let Some(timeout) = timeout {
            args.push(format!("--timeout={}s", timeout.as_secs()));
        }

        let invocation = self.invocation(args).streaming();
        self.runner.run(&invocation).await?.check(&invocation)?;
        Ok(())
    }

    /// Node port allocated to the service's first port, if it has one
    #[instrument(skip(self))]
    pub async fn node_port(&self, service: &str) -> Result<Option<u16>> {
        let invocation = self.invocation([
            "get",
            "service",
            service,
            "-o",
            "jsonpath={.spec.ports[0].nodePort}",
        ]);
        let output = self.runner.run(&invocation).await?.check(&invocation)?;
        let raw = output.stdout.trim();

        if raw.is_empty() {
            return Ok(None);
        }
        match raw.parse() {
            Ok(port) => Ok(Some(port)),
            Err(_) => {
                warn!("Service {} reported an unexpected node port '{}'", service, raw);
                Ok(None)
            }
        }
    }
}

/// Only the API server's NotFound counts as absence; client-side errors such as
/// an unknown context or a missing auth plugin also say "not found".
fn is_server_not_found(stderr: &str) -> bool {
    stderr
        .lines()
        .any(|line| line.starts_with("Error from server (NotFound):"))
}
