// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Platform detection and cross-platform command adaptation.
//!
//! This crate provides:
//! - [`Platform`] and [`ShellKind`] detection for the host machine
//! - [`CommandAdapter`]: a closed set of per-platform adapters that rewrite
//!   tool invocations (executable suffixes, environment-variable syntax,
//!   path separators) without touching literal URLs
//!
//! Validation checks are authored once per exercise and adapted at run time,
//! so the same `kubectl`/`docker` command strings work on Windows, macOS and
//! Linux.

mod adapter;
mod platform;

pub use adapter::{adapter_for, host_adapter, CommandAdapter};
pub use platform::{Platform, ShellKind};
