// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde::Serialize;

/// Glyphs used in detail lines. The UI renders them verbatim.
pub(crate) const PASS: &str = "✓";
pub(crate) const FAIL: &str = "❌";

/// Aggregate outcome of one validation invocation.
///
/// Produced fresh per call and never persisted. `success` is true iff every
/// aggregated check passed; `suggestions` is non-empty whenever `success` is
/// false.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationResult {
	pub success: bool,
	pub message: String,
	/// One line per check in declaration order; failures may add more.
	pub details: Vec<String>,
	pub suggestions: Vec<String>,
}

impl ValidationResult {
	pub fn passed(message: impl Into<String>) -> Self {
		Self {
			success: true,
			message: message.into(),
			details: Vec::new(),
			suggestions: Vec::new(),
		}
	}

	pub fn failed(message: impl Into<String>) -> Self {
		Self {
			success: false,
			message: message.into(),
			details: Vec::new(),
			suggestions: Vec::new(),
		}
	}

	pub fn with_details(mut self, details: Vec<String>) -> Self {
		self.details = details;
		self
	}

	pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
		self.suggestions = suggestions;
		self
	}
}
