// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Comprehensive deployment harness: a multi-section report over one
//! deployment, rendered as a human-readable summary.

use bosun_common_http::retry;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use tracing::info;

use crate::error::EngineError;
use crate::orchestrator::ValidationEngine;
use crate::result::{ValidationResult, FAIL, PASS};
use crate::validators::rules;

/// One harness section outcome.
#[derive(Clone, Debug)]
pub struct Section {
	pub name: String,
	pub passed: bool,
	pub detail: String,
}

impl Section {
	fn pass(name: &str, detail: impl Into<String>) -> Self {
		Self {
			name: name.to_string(),
			passed: true,
			detail: detail.into(),
		}
	}

	fn fail(name: &str, detail: impl Into<String>) -> Self {
		Self {
			name: name.to_string(),
			passed: false,
			detail: detail.into(),
		}
	}
}

const RESOURCE_CREATION: &str = "Resource Creation";
const CONFIGURATION: &str = "Configuration";
const POD_HEALTH: &str = "Pod Health";
const RESOURCE_LIMITS: &str = "Resource Limits";

/// Evaluate all harness sections against fetched state. Pure, so the
/// section logic is testable without a cluster.
pub(crate) fn evaluate_sections(
	name: &str,
	namespace: &str,
	deployment: Option<&Deployment>,
	pods: &[Pod],
) -> Vec<Section> {
	let Some(deployment) = deployment else {
		let reason = format!("deployment {name} not found in namespace {namespace}");
		return vec![
			Section::fail(RESOURCE_CREATION, reason.clone()),
			Section::fail(CONFIGURATION, format!("skipped: {reason}")),
			Section::fail(POD_HEALTH, format!("skipped: {reason}")),
			Section::fail(RESOURCE_LIMITS, format!("skipped: {reason}")),
		];
	};

	let mut sections = vec![Section::pass(
		RESOURCE_CREATION,
		format!("deployment {name} exists in namespace {namespace}"),
	)];

	sections.push(match rules::selector_matches_template(deployment) {
		Ok(()) => Section::pass(CONFIGURATION, "selector labels match the pod template"),
		Err(reason) => Section::fail(CONFIGURATION, reason),
	});

	let desired = rules::desired_replicas(deployment);
	let running = pods
		.iter()
		.filter(|pod| rules::pod_phase(pod) == Some("Running"))
		.count();
	sections.push(if rules::deployment_pods_healthy(deployment, pods) {
		Section::pass(
			POD_HEALTH,
			format!("{running}/{desired} pods running"),
		)
	} else {
		Section::fail(
			POD_HEALTH,
			format!("{running}/{desired} pods running ({} found)", pods.len()),
		)
	});

	sections.push(match rules::template_containers_have_limits(deployment) {
		Ok(()) => Section::pass(RESOURCE_LIMITS, "all containers declare resource limits"),
		Err(reason) => Section::fail(RESOURCE_LIMITS, reason),
	});

	sections
}

fn suggestion_for(section: &str) -> String {
	match section {
		RESOURCE_CREATION => {
			"Create the deployment: kubectl apply -f <manifest> -n <namespace>".to_string()
		}
		CONFIGURATION => {
			"Align spec.selector.matchLabels with spec.template.metadata.labels".to_string()
		}
		POD_HEALTH => {
			"Inspect the pods: kubectl describe pods -n <namespace> and kubectl logs".to_string()
		}
		RESOURCE_LIMITS => {
			"Add resources.limits to every container in the pod template".to_string()
		}
		_ => "Compare your resources against the exercise instructions".to_string(),
	}
}

/// Render the section outcomes into the aggregate result, with the
/// summary block the UI displays verbatim.
pub(crate) fn render_report(name: &str, sections: &[Section]) -> ValidationResult {
	let passed: Vec<&Section> = sections.iter().filter(|s| s.passed).collect();
	let failed: Vec<&Section> = sections.iter().filter(|s| !s.passed).collect();

	let mut details: Vec<String> = sections
		.iter()
		.map(|s| {
			let glyph = if s.passed { PASS } else { FAIL };
			format!("{glyph} {}: {}", s.name, s.detail)
		})
		.collect();

	details.push("Validation Summary".to_string());
	details.push(format!("Total checks: {}", sections.len()));
	details.push(format!("Passed: {}", passed.len()));
	details.push(format!("Failed: {}", failed.len()));

	if failed.is_empty() {
		let components = passed
			.iter()
			.map(|s| s.name.as_str())
			.collect::<Vec<_>>()
			.join(", ");
		details.push(format!("Validated components: {components}"));
		ValidationResult::passed(format!("Comprehensive validation passed for {name}"))
			.with_details(details)
	} else {
		if !passed.is_empty() {
			details.push(format!(
				"Passed checks: {}",
				passed
					.iter()
					.map(|s| s.name.as_str())
					.collect::<Vec<_>>()
					.join(", ")
			));
		}
		details.push(format!(
			"Failed checks: {}",
			failed
				.iter()
				.map(|s| s.name.as_str())
				.collect::<Vec<_>>()
				.join(", ")
		));
		let suggestions = failed
			.iter()
			.map(|s| suggestion_for(&s.name))
			.collect();
		ValidationResult::failed(format!("Comprehensive validation failed for {name}"))
			.with_details(details)
			.with_suggestions(suggestions)
	}
}

impl ValidationEngine {
	/// Run the full multi-section harness against one deployment.
	///
	/// Fails fast when the cluster is unreachable, with environment
	/// suggestions and no section evaluated.
	pub async fn validate_deployment_comprehensive(
		&self,
		name: &str,
		namespace: &str,
	) -> Result<ValidationResult, EngineError> {
		let snapshot = self.check_health(false).await;
		if !snapshot.kubernetes.available {
			let message = match &snapshot.kubernetes.error {
				Some(error) => format!("Kubernetes cluster is not available: {error}"),
				None => "Kubernetes cluster is not available".to_string(),
			};
			return Ok(ValidationResult::failed(message)
				.with_suggestions(self.health_suggestions(&snapshot)));
		}

		info!(name, namespace, "running comprehensive deployment validation");
		let retry_config = self.config.retry_config();
		let deployment = retry(&retry_config, || {
			self.cluster.get_deployment(name, namespace)
		})
		.await?;
		let pods = match &deployment {
			Some(deployment) => {
				let selector = deployment
					.spec
					.as_ref()
					.and_then(|spec| rules::selector_string(&spec.selector));
				retry(&retry_config, || {
					self.cluster.list_pods(namespace, selector.as_deref())
				})
				.await?
			}
			None => Vec::new(),
		};

		let sections = evaluate_sections(name, namespace, deployment.as_ref(), &pods);
		Ok(render_report(name, &sections))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil::{MockCluster, MockDocker};
	use bosun_config::EngineConfig;
	use k8s_openapi::api::apps::v1::DeploymentSpec;
	use k8s_openapi::api::core::v1::{Container, PodSpec, PodStatus, PodTemplateSpec, ResourceRequirements};
	use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
	use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
	use std::collections::BTreeMap;
	use std::sync::Arc;

	fn labels() -> BTreeMap<String, String> {
		[("app".to_string(), "web".to_string())].into_iter().collect()
	}

	fn full_deployment(replicas: i32, with_limits: bool) -> Deployment {
		let resources = with_limits.then(|| ResourceRequirements {
			limits: Some(
				[("cpu".to_string(), Quantity("200m".into()))]
					.into_iter()
					.collect(),
			),
			..Default::default()
		});
		Deployment {
			spec: Some(DeploymentSpec {
				replicas: Some(replicas),
				selector: LabelSelector {
					match_labels: Some(labels()),
					..Default::default()
				},
				template: PodTemplateSpec {
					metadata: Some(ObjectMeta {
						labels: Some(labels()),
						..Default::default()
					}),
					spec: Some(PodSpec {
						containers: vec![Container {
							name: "app".into(),
							resources,
							..Default::default()
						}],
						..Default::default()
					}),
				},
				..Default::default()
			}),
			..Default::default()
		}
	}

	fn running_pod(name: &str) -> Pod {
		Pod {
			metadata: ObjectMeta {
				name: Some(name.to_string()),
				labels: Some(labels()),
				..Default::default()
			},
			status: Some(PodStatus {
				phase: Some("Running".to_string()),
				..Default::default()
			}),
			..Default::default()
		}
	}

	#[test]
	fn all_sections_pass_on_a_healthy_deployment() {
		let deployment = full_deployment(2, true);
		let pods = vec![running_pod("web-1"), running_pod("web-2")];
		let sections = evaluate_sections("web", "default", Some(&deployment), &pods);
		assert_eq!(sections.len(), 4);
		assert!(sections.iter().all(|s| s.passed));
	}

	#[test]
	fn missing_deployment_fails_every_section() {
		let sections = evaluate_sections("web", "default", None, &[]);
		assert_eq!(sections.len(), 4);
		assert!(sections.iter().all(|s| !s.passed));
	}

	#[test]
	fn missing_limits_fail_only_the_limits_section() {
		let deployment = full_deployment(1, false);
		let pods = vec![running_pod("web-1")];
		let sections = evaluate_sections("web", "default", Some(&deployment), &pods);
		let failed: Vec<&str> = sections
			.iter()
			.filter(|s| !s.passed)
			.map(|s| s.name.as_str())
			.collect();
		assert_eq!(failed, vec![RESOURCE_LIMITS]);
	}

	#[test]
	fn report_carries_summary_and_per_section_suggestions() {
		let deployment = full_deployment(2, false);
		let pods = vec![running_pod("web-1")];
		let sections = evaluate_sections("web", "default", Some(&deployment), &pods);
		let result = render_report("web", &sections);

		assert!(!result.success);
		assert!(result.details.iter().any(|d| d == "Validation Summary"));
		assert!(result.details.iter().any(|d| d == "Total checks: 4"));
		assert!(result
			.details
			.iter()
			.any(|d| d.starts_with("Failed checks:")));
		// One suggestion per failed section: pod health and limits.
		assert_eq!(result.suggestions.len(), 2);
	}

	#[test]
	fn passing_report_lists_validated_components() {
		let deployment = full_deployment(1, true);
		let pods = vec![running_pod("web-1")];
		let sections = evaluate_sections("web", "default", Some(&deployment), &pods);
		let result = render_report("web", &sections);

		assert!(result.success);
		assert!(result.suggestions.is_empty());
		assert!(result
			.details
			.iter()
			.any(|d| d.starts_with("Validated components:")));
	}

	#[tokio::test]
	async fn comprehensive_validation_fails_fast_without_a_cluster() {
		let engine = ValidationEngine::new(
			Arc::new(MockCluster::down("connection refused")),
			Arc::new(MockDocker::up()),
			EngineConfig::default(),
		);
		let result = engine
			.validate_deployment_comprehensive("web", "default")
			.await
			.unwrap();
		assert!(!result.success);
		assert!(result.message.contains("not available"));
		assert!(!result.suggestions.is_empty());
	}

	#[tokio::test]
	async fn comprehensive_validation_end_to_end() {
		let cluster = MockCluster::up()
			.with_deployment("default", "web", full_deployment(2, true))
			.with_pods("default", vec![running_pod("web-1"), running_pod("web-2")]);
		let engine = ValidationEngine::new(
			Arc::new(cluster),
			Arc::new(MockDocker::up()),
			EngineConfig::default(),
		);
		let result = engine
			.validate_deployment_comprehensive("web", "default")
			.await
			.unwrap();
		assert!(result.success, "details: {:?}", result.details);
	}
}
