// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes manifests, the kubectl wrapper, and kubeconfig context lookup.

pub mod context;
pub mod kubectl;
pub mod manifests;

pub use context::target_context;
pub use kubectl::{Kubectl, Lookup, Removal};
pub use manifests::{Manifest, ManifestSet, ResourceRef, Stage};
