// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use bosun_common_http::RetryableError;
use thiserror::Error;

/// Result type alias for cluster operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur during cluster operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("Kubernetes API error: {message}")]
	Api { message: String, code: Option<u16> },

	#[error("failed to reach the Kubernetes API: {message}")]
	Transport { message: String },

	#[error("pod not found: {name}")]
	PodNotFound { name: String },

	#[error("pod exec failed: {message}")]
	Exec { message: String },

	#[error("operation timed out")]
	Timeout,

	/// Caller passed a resource kind this client does not support. This is
	/// a contract violation, not an environment problem, and is never
	/// converted into a "resource absent" answer.
	#[error("unsupported resource kind: {kind}")]
	UnsupportedKind { kind: String },
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		match err {
			kube::Error::Api(response) => K8sError::Api {
				message: response.message,
				code: Some(response.code),
			},
			other => K8sError::Transport {
				message: other.to_string(),
			},
		}
	}
}

impl RetryableError for K8sError {
	fn is_retryable(&self) -> bool {
		match self {
			K8sError::Api { code: Some(code), .. } => matches!(code, 502 | 503 | 504),
			K8sError::Timeout => true,
			K8sError::Transport { message } => {
				let message = message.to_ascii_lowercase();
				message.contains("connection refused")
					|| message.contains("connection reset")
					|| message.contains("timed out")
					|| message.contains("timeout")
					|| message.contains("dns")
					|| message.contains("unreachable")
			}
			_ => false,
		}
	}
}
