// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::time::Duration;

use bosun_common_http::RetryableError;
use thiserror::Error;

/// Result type alias for image operations.
pub type DockerResult<T> = Result<T, DockerError>;

/// Errors that can occur during image operations.
#[derive(Error, Debug)]
pub enum DockerError {
	#[error("cannot connect to the Docker daemon: {message}")]
	DaemonUnavailable { message: String },

	#[error("docker command failed: {message}")]
	CommandFailed { message: String },

	#[error("docker command exceeded timeout of {timeout:?}")]
	Timeout { timeout: Duration },

	#[error("failed to spawn docker: {source}")]
	Spawn {
		#[source]
		source: std::io::Error,
	},

	#[error("unexpected docker output: {message}")]
	Parse { message: String },
}

impl RetryableError for DockerError {
	fn is_retryable(&self) -> bool {
		matches!(
			self,
			DockerError::DaemonUnavailable { .. } | DockerError::Timeout { .. }
		)
	}
}
