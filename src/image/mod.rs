// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Runtime image description and build.

pub mod builder;
pub mod dockerfile;

pub use builder::ImageBuilder;
pub use dockerfile::{HealthCheck, ImageSpec};
