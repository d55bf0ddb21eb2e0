// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Errors raised while resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("invalid value for {variable}: {value:?} ({reason})")]
	InvalidValue {
		variable: String,
		value: String,
		reason: String,
	},
}

impl ConfigError {
	pub(crate) fn invalid(variable: &str, value: &str, reason: impl Into<String>) -> Self {
		ConfigError::InvalidValue {
			variable: variable.to_string(),
			value: value.to_string(),
			reason: reason.into(),
		}
	}
}
