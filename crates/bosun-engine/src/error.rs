// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use bosun_docker::DockerError;
use bosun_k8s::K8sError;
use thiserror::Error;

/// Errors that can cross the engine boundary.
///
/// Check-level failures never appear here — they resolve into the returned
/// [`ValidationResult`](crate::ValidationResult). What remains is structural
/// unavailability and caller defects such as an unsupported resource kind.
#[derive(Error, Debug)]
pub enum EngineError {
	#[error("Kubernetes cluster is not available: {message}")]
	ClusterUnavailable { message: String },

	#[error("Docker daemon is not available: {message}")]
	DockerUnavailable { message: String },

	#[error(transparent)]
	K8s(#[from] K8sError),

	#[error(transparent)]
	Docker(#[from] DockerError),

	#[error("custom validator failed: {message}")]
	Validator { message: String },
}
