// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Execution of external tools (docker, kubectl).

pub mod runner;

pub use runner::{require_tool, CommandOutput, CommandRunner, Invocation, SystemRunner};
