// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Container image client for Bosun validation.
//!
//! This crate provides:
//! - [`ImageClient`]: the trait the validation engine consumes — build,
//!   inspect and list images, plus a daemon reachability probe
//! - [`CommandDockerClient`]: the docker-CLI-backed implementation with
//!   streamed build output
//! - [`DockerError`]: error taxonomy with transient-failure classification

mod client;
mod error;

pub use client::{BuildResult, CommandDockerClient, ImageClient, ImageInfo};
pub use error::{DockerError, DockerResult};
