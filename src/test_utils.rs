// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking external tool invocations.

use crate::error::Result;
use crate::process::{CommandOutput, CommandRunner, Invocation};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A mock runner that records every invocation and answers from predefined
/// responses keyed by command-line prefix.
#[derive(Clone)]
pub struct MockRunner {
    responses: Arc<Mutex<Vec<(String, CommandOutput)>>>,
    calls: Arc<Mutex<Vec<Invocation>>>,
    missing_tools: HashSet<String>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            missing_tools: HashSet::new(),
        }
    }

    /// Answer commands whose command line starts with `prefix`
    pub fn on(self, prefix: &str, code: i32, stdout: &str, stderr: &str) -> Self {
        self.responses.lock().unwrap().push((
            prefix.to_string(),
            CommandOutput {
                code: Some(code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        ));
        self
    }

    /// Make `locate` report the program as absent
    pub fn without_tool(mut self, program: &str) -> Self {
        self.missing_tools.insert(program.to_string());
        self
    }

    /// Every invocation so far, in order
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Command lines of every invocation so far, in order
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(Invocation::command_line).collect()
    }

    fn find_response(&self, command_line: &str) -> Option<CommandOutput> {
        let responses = self.responses.lock().unwrap();

        // Longest matching prefix wins, so specific responses can override broad ones
        responses
            .iter()
            .filter(|(prefix, _)| command_line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, output)| output.clone())
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        if self.missing_tools.contains(program) {
            None
        } else {
            Some(PathBuf::from("/usr/local/bin").join(program))
        }
    }

    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        // Unmatched commands succeed silently
        Ok(self
            .find_response(&invocation.command_line())
            .unwrap_or(CommandOutput {
                code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            }))
    }
}

/// stderr kubectl prints for a missing object
pub fn not_found_stderr(resource: &str, name: &str) -> String {
    format!(
        "Error from server (NotFound): {} \"{}\" not found\n",
        resource, name
    )
}

/// stderr kubectl prints when a list selector matches nothing
pub fn no_resources_stderr(namespace: &str) -> String {
    format!("No resources found in {} namespace.\n", namespace)
}
