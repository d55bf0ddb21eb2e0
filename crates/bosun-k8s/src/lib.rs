// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Kubernetes cluster resource client for Bosun validation.
//!
//! This crate provides:
//! - [`ClusterClient`]: the trait the validation engine consumes — typed
//!   resource getters, dynamic fetch/list by [`ResourceKind`], in-pod exec,
//!   and a cheap reachability probe
//! - [`KubeClusterClient`]: the `kube`-backed implementation
//! - [`K8sError`]: error taxonomy with transient-failure classification for
//!   the retry controller
//!
//! "Resource absent" is `Ok(None)`; an unsupported kind string is a caller
//! defect and fails loudly.

mod client;
mod error;
mod kind;

pub use client::{ClusterClient, KubeClusterClient};
pub use error::{K8sError, K8sResult};
pub use kind::ResourceKind;
