// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command runner abstraction over `tokio::process`

use crate::error::{DeployError, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Number of stderr lines kept in a `CommandFailed` error
const STDERR_TAIL_LINES: usize = 20;

/// A single external command: program, arguments and optional stdin payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    /// Echo output to the terminal line by line while the command runs
    pub stream: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            stream: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Program and arguments joined with spaces, for logs and errors
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// What a finished command produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into `DeployError::CommandFailed`
    pub fn check(self, invocation: &Invocation) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(DeployError::CommandFailed {
            command: invocation.command_line(),
            code: self.code,
            stderr: stderr_tail(&self.stderr),
        })
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Seam between the dispatcher and the host's process table
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Resolve `program` on the search path
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run to completion. A non-zero exit is not an error at this level;
    /// only failing to start the process is.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Fail with `ToolNotFound` unless `program` can be resolved
pub fn require_tool<R>(runner: &R, program: &str, hint: &'static str) -> Result<PathBuf>
where
    R: CommandRunner + ?Sized,
{
    match runner.locate(program) {
        Some(path) => {
            debug!("Found {} at {}", program, path.display());
            Ok(path)
        }
        None => Err(DeployError::ToolNotFound {
            tool: program.to_string(),
            hint,
        }),
    }
}

/// Runs commands on the local host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    #[instrument(skip(self, invocation), fields(command = %invocation))]
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!("Running {}", invocation);

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DeployError::Spawn {
                command: invocation.command_line(),
                source,
            })?;

        // Feed stdin from a separate task so a chatty child cannot block on a full stdout pipe
        let writer = match (child.stdin.take(), invocation.stdin.clone()) {
            (Some(mut pipe), Some(input)) => Some(tokio::spawn(async move {
                pipe.write_all(input.as_bytes()).await?;
                pipe.shutdown().await
            })),
            _ => None,
        };

        let (stdout, stderr) = tokio::join!(
            read_lines(child.stdout.take(), invocation.stream.then_some(Echo::Stdout)),
            read_lines(child.stderr.take(), invocation.stream.then_some(Echo::Stderr)),
        );
        let status = child.wait().await?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Failed to write stdin of {}: {}", invocation.program, e),
                Err(e) => warn!("stdin writer for {} panicked: {}", invocation.program, e),
            }
        }

        let output = CommandOutput {
            code: status.code(),
            stdout: stdout?,
            stderr: stderr?,
        };
        debug!("{} exited with {:?}", invocation.program, output.code);
        Ok(output)
    }
}

#[derive(Debug, Clone, Copy)]
enum Echo {
    Stdout,
    Stderr,
}

async fn read_lines<T>(pipe: Option<T>, echo: Option<Echo>) -> std::io::Result<String>
where
    T: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else {
        return Ok(String::new());
    };

    let mut collected = String::new();
    let mut lines = BufReader::new(pipe).lines();
    while let Some(line) = lines.next_line().await? {
        match echo {
            Some(Echo::Stdout) => println!("{}", line),
            Some(Echo::Stderr) => eprintln!("{}", line),
            None => {}
        }
        collected.push_str(&line);
        collected.push('\n');
    }
    Ok(collected)
}
