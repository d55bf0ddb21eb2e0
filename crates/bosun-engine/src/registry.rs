// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Registry of custom validators referenced by id from criteria.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bosun_common_http::ProbeClient;
use bosun_docker::ImageClient;
use bosun_k8s::ClusterClient;

use crate::error::EngineError;

/// Execution context handed to custom validators.
#[derive(Clone)]
pub struct CheckContext {
	pub step_id: String,
	pub cluster: Arc<dyn ClusterClient>,
	pub docker: Arc<dyn ImageClient>,
	pub http: ProbeClient,
}

/// A predicate registered by id and referenced from exercise criteria.
#[async_trait]
pub trait CustomValidator: Send + Sync {
	/// Stable id the criteria reference.
	fn id(&self) -> &str;

	/// Short description rendered into the detail line.
	fn description(&self) -> &str;

	/// Evaluate the predicate. An `Err` is treated by the check runner as a
	/// failed check, never as a propagating error.
	async fn validate(&self, ctx: &CheckContext) -> Result<bool, EngineError>;
}

/// Custom validators keyed by id.
pub struct ValidatorRegistry {
	validators: HashMap<String, Arc<dyn CustomValidator>>,
}

impl ValidatorRegistry {
	pub fn new() -> Self {
		Self {
			validators: HashMap::new(),
		}
	}

	pub fn register(&mut self, validator: Arc<dyn CustomValidator>) {
		let id = validator.id().to_string();
		tracing::debug!(validator_id = %id, "registering custom validator");
		self.validators.insert(id, validator);
	}

	pub fn get(&self, id: &str) -> Option<Arc<dyn CustomValidator>> {
		self.validators.get(id).cloned()
	}

	pub fn ids(&self) -> Vec<&str> {
		self.validators.keys().map(|k| k.as_str()).collect()
	}
}

impl Default for ValidatorRegistry {
	fn default() -> Self {
		Self::new()
	}
}
