// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The validation engine: per-step orchestration over the cluster, image
//! and HTTP clients.

use std::sync::Arc;

use bosun_common_http::ProbeClient;
use bosun_common_os::{host_adapter, CommandAdapter};
use bosun_config::EngineConfig;
use bosun_docker::ImageClient;
use bosun_health::{HealthMonitor, HealthSnapshot};
use bosun_k8s::ClusterClient;
use tracing::{info, warn};

use crate::criteria::{CriteriaType, ValidationCriteria};
use crate::registry::{CheckContext, ValidatorRegistry};
use crate::result::{ValidationResult, FAIL};
use crate::runner::CheckRunner;
use crate::suggest;

/// Orchestrates validation of exercise steps.
///
/// Holds one client per subsystem and a memoizing [`HealthMonitor`] over
/// them. Results are computed fresh per call; only subsystem availability is
/// cached, and [`reset_availability_cache`](Self::reset_availability_cache)
/// drops that cache.
pub struct ValidationEngine {
	pub(crate) cluster: Arc<dyn ClusterClient>,
	pub(crate) docker: Arc<dyn ImageClient>,
	pub(crate) probe: ProbeClient,
	pub(crate) config: EngineConfig,
	health: HealthMonitor,
	registry: Arc<ValidatorRegistry>,
	runner: CheckRunner,
}

impl ValidationEngine {
	/// Build an engine over the given clients, using the host platform's
	/// command adapter and an empty validator registry.
	pub fn new(
		cluster: Arc<dyn ClusterClient>,
		docker: Arc<dyn ImageClient>,
		config: EngineConfig,
	) -> Self {
		Self::with_registry(cluster, docker, config, ValidatorRegistry::new())
	}

	/// Build an engine with a pre-populated validator registry.
	pub fn with_registry(
		cluster: Arc<dyn ClusterClient>,
		docker: Arc<dyn ImageClient>,
		config: EngineConfig,
		registry: ValidatorRegistry,
	) -> Self {
		let probe = ProbeClient::new(config.validation_timeout);
		let registry = Arc::new(registry);
		let runner = CheckRunner::new(
			host_adapter(),
			probe.clone(),
			Arc::clone(&registry),
			config.validation_timeout,
		);
		let health = HealthMonitor::new(Arc::clone(&cluster), Arc::clone(&docker));
		Self {
			cluster,
			docker,
			probe,
			config,
			health,
			registry,
			runner,
		}
	}

	/// Replace the command adapter, e.g. to validate commands for a
	/// different platform in tests.
	pub fn with_adapter(mut self, adapter: Box<dyn CommandAdapter>) -> Self {
		self.runner = CheckRunner::new(
			adapter,
			self.probe.clone(),
			Arc::clone(&self.registry),
			self.config.validation_timeout,
		);
		self
	}

	/// Validate one exercise step against its declarative criteria.
	///
	/// When the subsystem the criteria depend on is down, the result fails
	/// fast with one skipped line per check and environment-level
	/// suggestions; no check runs. Check failures always resolve into the
	/// result, never into an `Err`.
	pub async fn validate_step(
		&self,
		step_id: &str,
		criteria: &ValidationCriteria,
	) -> ValidationResult {
		info!(
			step_id,
			criteria_type = ?criteria.criteria_type,
			checks = criteria.checks.len(),
			"validating step"
		);

		if let Some(result) = self.fail_fast(step_id, criteria).await {
			return result;
		}

		let ctx = CheckContext {
			step_id: step_id.to_string(),
			cluster: Arc::clone(&self.cluster),
			docker: Arc::clone(&self.docker),
			http: self.probe.clone(),
		};

		let mut details = Vec::new();
		let mut failed = Vec::new();
		for check in &criteria.checks {
			let outcome = self.runner.run(check, &ctx).await;
			if !outcome.passed {
				failed.push(outcome.detail.clone());
			}
			details.push(outcome.detail);
			details.extend(outcome.extra);
		}

		if failed.is_empty() {
			info!(step_id, "step validation passed");
			ValidationResult::passed(format!("Validation passed for step {step_id}"))
				.with_details(details)
		} else {
			warn!(step_id, failed = failed.len(), "step validation failed");
			ValidationResult::failed(format!("Validation failed for step {step_id}"))
				.with_details(details)
				.with_suggestions(suggest::for_failure_text(&failed.join("\n")))
		}
	}

	/// Structural availability gate for the criteria's execution domain.
	async fn fail_fast(
		&self,
		step_id: &str,
		criteria: &ValidationCriteria,
	) -> Option<ValidationResult> {
		// Only kubernetes and docker criteria have a structural dependency;
		// custom validators decide for themselves what they reach for.
		let needs_cluster = matches!(criteria.criteria_type, CriteriaType::Kubernetes);
		let needs_docker = matches!(criteria.criteria_type, CriteriaType::Docker);
		if !needs_cluster && !needs_docker {
			return None;
		}

		let snapshot = self.health.check_health(false).await;
		let blocker = if needs_cluster && !snapshot.kubernetes.available {
			Some((
				"Kubernetes cluster is not available",
				snapshot.kubernetes.error.clone(),
			))
		} else if needs_docker && !snapshot.docker.available {
			Some((
				"Docker daemon is not available",
				snapshot.docker.error.clone(),
			))
		} else {
			None
		};

		let (what, error) = blocker?;
		warn!(step_id, error = error.as_deref(), "{what}, skipping checks");
		let message = match error {
			Some(error) => format!("{what}: {error}"),
			None => what.to_string(),
		};
		let details = criteria
			.checks
			.iter()
			.map(|check| format!("{FAIL} skipped: {}", check.describe()))
			.collect();
		Some(
			ValidationResult::failed(message)
				.with_details(details)
				.with_suggestions(self.health.suggestions(&snapshot)),
		)
	}

	/// Current subsystem health, honoring the availability cache unless
	/// `force_refresh` is set.
	pub async fn check_health(&self, force_refresh: bool) -> HealthSnapshot {
		self.health.check_health(force_refresh).await
	}

	/// Drop the cached availability snapshot, forcing the next health check
	/// to probe again.
	pub async fn reset_availability_cache(&self) {
		self.health.clear_cache().await;
	}

	/// Environment-level remediation suggestions for a health snapshot.
	pub fn health_suggestions(&self, snapshot: &HealthSnapshot) -> Vec<String> {
		self.health.suggestions(snapshot)
	}
}
