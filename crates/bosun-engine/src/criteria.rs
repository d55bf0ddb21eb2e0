// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Declarative validation criteria, authored externally per exercise step.
//!
//! Criteria stay fully serializable: a check is a closed tagged variant, and
//! custom logic is referenced by registry id rather than embedded as a
//! callback.

use bosun_common_http::ExpectedResponse;
use serde::{Deserialize, Serialize};

/// Execution domain of one step's criteria.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriteriaType {
	Kubernetes,
	Docker,
	Http,
	Custom,
}

/// The declarative bundle of checks for one exercise step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationCriteria {
	#[serde(rename = "type")]
	pub criteria_type: CriteriaType,
	pub checks: Vec<ValidationCheck>,
}

/// One atomic probe. Exactly one shape per check.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ValidationCheck {
	/// Run a command through the OS adapter and the process executor.
	///
	/// Passes when `expected_output` (if present) is a substring of stdout,
	/// otherwise when the exit code is zero.
	Command {
		command: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		expected_output: Option<String>,
	},
	/// Probe an HTTP endpoint.
	///
	/// With no expectation set, any HTTP status counts as reachable;
	/// otherwise every constrained dimension must match.
	Http {
		url: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		method: Option<String>,
		#[serde(default)]
		expected: ExpectedResponse,
	},
	/// Invoke a predicate registered in the validator registry.
	Custom { validator: String },
}

impl ValidationCheck {
	/// Short human description used as the detail-line subject.
	pub fn describe(&self) -> String {
		match self {
			ValidationCheck::Command { command, .. } => command.clone(),
			ValidationCheck::Http { url, method, .. } => {
				format!("{} {}", method.as_deref().unwrap_or("GET"), url)
			}
			ValidationCheck::Custom { validator } => format!("custom check '{validator}'"),
		}
	}
}
