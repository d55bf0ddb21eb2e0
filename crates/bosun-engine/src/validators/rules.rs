// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Pure predicates over fetched cluster data.
//!
//! Everything here is synchronous and side-effect free so the rules can be
//! unit tested against constructed API objects, without a cluster.

use base64::Engine as _;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use serde_json::Value;

/// Which probe kinds a container must define.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeKind {
	Liveness,
	Readiness,
	Both,
}

/// Expected resource requests/limits. Absent fields are not checked; an
/// entirely empty expectation means "at least one container declares any
/// requests or limits".
#[derive(Clone, Debug, Default)]
pub struct ResourceExpectations {
	pub cpu_request: Option<String>,
	pub cpu_limit: Option<String>,
	pub memory_request: Option<String>,
	pub memory_limit: Option<String>,
}

impl ResourceExpectations {
	pub fn is_empty(&self) -> bool {
		self.cpu_request.is_none()
			&& self.cpu_limit.is_none()
			&& self.memory_request.is_none()
			&& self.memory_limit.is_none()
	}
}

/// Render a label selector as the `key=value,key=value` string the list API
/// takes. `None` when the selector has no match labels.
pub(crate) fn selector_string(selector: &LabelSelector) -> Option<String> {
	let labels = selector.match_labels.as_ref()?;
	if labels.is_empty() {
		return None;
	}
	Some(
		labels
			.iter()
			.map(|(k, v)| format!("{k}={v}"))
			.collect::<Vec<_>>()
			.join(","),
	)
}

/// Replica count the deployment asks for; the API defaults absent to 1.
pub(crate) fn desired_replicas(deployment: &Deployment) -> i32 {
	deployment
		.spec
		.as_ref()
		.and_then(|s| s.replicas)
		.unwrap_or(1)
}

pub(crate) fn pod_phase(pod: &Pod) -> Option<&str> {
	pod.status.as_ref().and_then(|s| s.phase.as_deref())
}

pub(crate) fn all_pods_running(pods: &[Pod]) -> bool {
	pods.iter().all(|pod| pod_phase(pod) == Some("Running"))
}

/// Strict pod health: count equals requested replicas and every pod is
/// `Running`. Partial availability during a rollout counts as unhealthy; a
/// deployment scaled to zero with no pods is vacuously healthy.
pub(crate) fn deployment_pods_healthy(deployment: &Deployment, pods: &[Pod]) -> bool {
	pods.len() as i32 == desired_replicas(deployment) && all_pods_running(pods)
}

pub(crate) fn config_map_has_keys(config_map: &ConfigMap, keys: &[&str]) -> bool {
	let Some(data) = config_map.data.as_ref() else {
		return keys.is_empty();
	};
	keys.iter().all(|key| data.contains_key(*key))
}

pub(crate) fn is_valid_base64(value: &str) -> bool {
	base64::engine::general_purpose::STANDARD.decode(value).is_ok()
}

/// Validate raw secret data: every expected key present and every value
/// syntactically valid base64. `data` is the raw `data` field of the secret
/// as returned by the API, i.e. a map of base64 strings.
pub(crate) fn secret_data_has_valid_keys(data: Option<&Value>, keys: &[&str]) -> bool {
	let Some(Value::Object(map)) = data else {
		return keys.is_empty();
	};
	keys.iter().all(|key| match map.get(*key) {
		Some(Value::String(value)) => is_valid_base64(value),
		_ => false,
	})
}

pub(crate) fn pvc_is_bound(pvc: &PersistentVolumeClaim) -> bool {
	pvc.status
		.as_ref()
		.and_then(|s| s.phase.as_deref())
		== Some("Bound")
}

/// Whether any container references the named ConfigMap or Secret through
/// env vars, envFrom, or a mounted volume.
pub(crate) fn pod_references_config(pod: &Pod, name: &str) -> bool {
	let Some(spec) = pod.spec.as_ref() else {
		return false;
	};

	let via_volume = spec.volumes.iter().flatten().any(|volume| {
		volume.config_map.as_ref().map(|cm| cm.name.as_str()) == Some(name)
			|| volume
				.secret
				.as_ref()
				.and_then(|s| s.secret_name.as_deref())
				== Some(name)
	});
	if via_volume {
		return true;
	}

	spec.containers.iter().any(|container| {
		let via_env = container.env.iter().flatten().any(|env| {
			env.value_from.as_ref().is_some_and(|source| {
				source
					.config_map_key_ref
					.as_ref()
					.map(|r| r.name.as_str())
					== Some(name)
					|| source
						.secret_key_ref
						.as_ref()
						.map(|r| r.name.as_str())
						== Some(name)
			})
		});
		let via_env_from = container.env_from.iter().flatten().any(|source| {
			source
				.config_map_ref
				.as_ref()
				.map(|r| r.name.as_str())
				== Some(name)
				|| source
					.secret_ref
					.as_ref()
					.map(|r| r.name.as_str())
					== Some(name)
		});
		via_env || via_env_from
	})
}

/// Mount path of the volume backed by the named claim, if any container
/// mounts it.
pub(crate) fn pvc_mount_path(pod: &Pod, claim: &str) -> Option<String> {
	let spec = pod.spec.as_ref()?;
	let volume_name = spec
		.volumes
		.iter()
		.flatten()
		.find(|volume| {
			volume
				.persistent_volume_claim
				.as_ref()
				.map(|pvc| pvc.claim_name.as_str())
				== Some(claim)
		})
		.map(|volume| volume.name.clone())?;

	spec.containers
		.iter()
		.flat_map(|c| c.volume_mounts.iter().flatten())
		.find(|mount| mount.name == volume_name)
		.map(|mount| mount.mount_path.clone())
}

/// Every container defines the requested probe kind(s).
pub(crate) fn containers_have_probes(pod: &Pod, kind: ProbeKind) -> bool {
	let Some(spec) = pod.spec.as_ref() else {
		return false;
	};
	if spec.containers.is_empty() {
		return false;
	}
	spec.containers.iter().all(|container| match kind {
		ProbeKind::Liveness => container.liveness_probe.is_some(),
		ProbeKind::Readiness => container.readiness_probe.is_some(),
		ProbeKind::Both => {
			container.liveness_probe.is_some() && container.readiness_probe.is_some()
		}
	})
}

/// The pod reports a `Ready` condition with status `True`.
pub(crate) fn pod_is_ready(pod: &Pod) -> bool {
	pod.status
		.as_ref()
		.and_then(|s| s.conditions.as_ref())
		.is_some_and(|conditions| {
			conditions
				.iter()
				.any(|c| c.type_ == "Ready" && c.status == "True")
		})
}

/// Manual scaling: both the requested and the ready replica count equal the
/// expectation.
pub(crate) fn scaling_matches(deployment: &Deployment, expected: i32) -> bool {
	let requested = deployment.spec.as_ref().and_then(|s| s.replicas);
	let ready = deployment.status.as_ref().and_then(|s| s.ready_replicas);
	requested == Some(expected) && ready == Some(expected)
}

/// Resource requests/limits validation per [`ResourceExpectations`].
pub(crate) fn resources_match(pod: &Pod, expected: &ResourceExpectations) -> bool {
	let Some(spec) = pod.spec.as_ref() else {
		return false;
	};

	if expected.is_empty() {
		return spec.containers.iter().any(|container| {
			container.resources.as_ref().is_some_and(|r| {
				r.requests.as_ref().is_some_and(|m| !m.is_empty())
					|| r.limits.as_ref().is_some_and(|m| !m.is_empty())
			})
		});
	}

	spec.containers.iter().any(|container| {
		let Some(resources) = container.resources.as_ref() else {
			return false;
		};
		let requests = resources.requests.as_ref();
		let limits = resources.limits.as_ref();
		let matches = |map: Option<&std::collections::BTreeMap<
			String,
			k8s_openapi::apimachinery::pkg::api::resource::Quantity,
		>>,
		               key: &str,
		               want: &Option<String>| {
			match want {
				None => true,
				Some(value) => map
					.and_then(|m| m.get(key))
					.map(|q| q.0 == *value)
					.unwrap_or(false),
			}
		};
		matches(requests, "cpu", &expected.cpu_request)
			&& matches(requests, "memory", &expected.memory_request)
			&& matches(limits, "cpu", &expected.cpu_limit)
			&& matches(limits, "memory", &expected.memory_limit)
	})
}

/// Every template container declares resource limits. Used by the
/// comprehensive harness.
pub(crate) fn template_containers_have_limits(deployment: &Deployment) -> Result<(), String> {
	let containers = deployment
		.spec
		.as_ref()
		.and_then(|s| s.template.spec.as_ref())
		.map(|s| s.containers.as_slice())
		.unwrap_or_default();
	if containers.is_empty() {
		return Err("the pod template declares no containers".to_string());
	}
	for container in containers {
		let has_limits = container
			.resources
			.as_ref()
			.and_then(|r| r.limits.as_ref())
			.is_some_and(|limits| !limits.is_empty());
		if !has_limits {
			return Err(format!(
				"container {} declares no resource limits",
				container.name
			));
		}
	}
	Ok(())
}

/// Selector/template coherence for the comprehensive harness: match labels
/// exist and the pod template carries all of them.
pub(crate) fn selector_matches_template(deployment: &Deployment) -> Result<(), String> {
	let Some(spec) = deployment.spec.as_ref() else {
		return Err("deployment has no spec".to_string());
	};
	let Some(match_labels) = spec.selector.match_labels.as_ref().filter(|m| !m.is_empty()) else {
		return Err("selector declares no match labels".to_string());
	};
	let template_labels = spec
		.template
		.metadata
		.as_ref()
		.and_then(|m| m.labels.as_ref());
	let Some(template_labels) = template_labels else {
		return Err("pod template declares no labels".to_string());
	};
	for (key, value) in match_labels {
		if template_labels.get(key) != Some(value) {
			return Err(format!("template is missing selector label {key}={value}"));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use k8s_openapi::api::apps::v1::{DeploymentSpec, DeploymentStatus};
	use k8s_openapi::api::core::v1::{
		Container, PersistentVolumeClaimStatus, PodCondition, PodSpec, PodStatus, PodTemplateSpec,
		Probe, ResourceRequirements, Volume, VolumeMount,
	};
	use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
	use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
	use serde_json::json;
	use std::collections::BTreeMap;

	fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	fn pod_with_phase(phase: &str) -> Pod {
		Pod {
			status: Some(PodStatus {
				phase: Some(phase.to_string()),
				..Default::default()
			}),
			..Default::default()
		}
	}

	fn deployment_with_replicas(replicas: i32) -> Deployment {
		Deployment {
			spec: Some(DeploymentSpec {
				replicas: Some(replicas),
				selector: LabelSelector {
					match_labels: Some(labels(&[("app", "web")])),
					..Default::default()
				},
				template: PodTemplateSpec {
					metadata: Some(ObjectMeta {
						labels: Some(labels(&[("app", "web")])),
						..Default::default()
					}),
					..Default::default()
				},
				..Default::default()
			}),
			..Default::default()
		}
	}

	#[test]
	fn selector_string_joins_match_labels() {
		let selector = LabelSelector {
			match_labels: Some(labels(&[("app", "web"), ("tier", "front")])),
			..Default::default()
		};
		// BTreeMap iteration is ordered by key.
		assert_eq!(selector_string(&selector).unwrap(), "app=web,tier=front");
		assert!(selector_string(&LabelSelector::default()).is_none());
	}

	#[test]
	fn three_running_pods_match_three_replicas() {
		let deployment = deployment_with_replicas(3);
		let pods = vec![
			pod_with_phase("Running"),
			pod_with_phase("Running"),
			pod_with_phase("Running"),
		];
		assert!(deployment_pods_healthy(&deployment, &pods));
	}

	#[test]
	fn one_pending_pod_fails_health() {
		let deployment = deployment_with_replicas(3);
		let pods = vec![
			pod_with_phase("Running"),
			pod_with_phase("Running"),
			pod_with_phase("Pending"),
		];
		assert!(!deployment_pods_healthy(&deployment, &pods));
	}

	#[test]
	fn pod_count_mismatch_fails_health() {
		let deployment = deployment_with_replicas(3);
		let pods = vec![pod_with_phase("Running"), pod_with_phase("Running")];
		assert!(!deployment_pods_healthy(&deployment, &pods));
	}

	#[test]
	fn scaled_to_zero_deployment_with_no_pods_is_healthy() {
		let deployment = deployment_with_replicas(0);
		assert!(deployment_pods_healthy(&deployment, &[]));
		// A straggler pod still counts against the requested zero.
		assert!(!deployment_pods_healthy(&deployment, &[pod_with_phase("Running")]));
	}

	#[test]
	fn config_map_keys_are_a_superset_check() {
		let config_map = ConfigMap {
			data: Some(
				[("DB_HOST", "db"), ("DB_PORT", "5432"), ("EXTRA", "x")]
					.into_iter()
					.map(|(k, v)| (k.to_string(), v.to_string()))
					.collect(),
			),
			..Default::default()
		};
		assert!(config_map_has_keys(&config_map, &["DB_HOST", "DB_PORT"]));
		assert!(!config_map_has_keys(&config_map, &["DB_HOST", "DB_NAME"]));
	}

	#[test]
	fn secret_values_must_be_valid_base64() {
		let valid = json!({"password": "c2VjcmV0"});
		assert!(secret_data_has_valid_keys(Some(&valid), &["password"]));

		let invalid = json!({"password": "not_base64!!"});
		assert!(!secret_data_has_valid_keys(Some(&invalid), &["password"]));

		let missing = json!({"other": "c2VjcmV0"});
		assert!(!secret_data_has_valid_keys(Some(&missing), &["password"]));
	}

	#[test]
	fn pvc_binding_requires_bound_phase() {
		let bound = PersistentVolumeClaim {
			status: Some(PersistentVolumeClaimStatus {
				phase: Some("Bound".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(pvc_is_bound(&bound));

		let pending = PersistentVolumeClaim {
			status: Some(PersistentVolumeClaimStatus {
				phase: Some("Pending".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(!pvc_is_bound(&pending));
	}

	#[test]
	fn volume_mounted_config_map_is_a_reference() {
		let pod = Pod {
			spec: Some(PodSpec {
				containers: vec![Container {
					name: "app".into(),
					..Default::default()
				}],
				volumes: Some(vec![Volume {
					name: "config".into(),
					config_map: Some(k8s_openapi::api::core::v1::ConfigMapVolumeSource {
						name: "app-config".into(),
						..Default::default()
					}),
					..Default::default()
				}]),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(pod_references_config(&pod, "app-config"));
		assert!(!pod_references_config(&pod, "other-config"));
	}

	#[test]
	fn env_key_references_are_detected() {
		let pod = Pod {
			spec: Some(PodSpec {
				containers: vec![Container {
					name: "app".into(),
					env: Some(vec![k8s_openapi::api::core::v1::EnvVar {
						name: "DB_PASSWORD".into(),
						value_from: Some(k8s_openapi::api::core::v1::EnvVarSource {
							secret_key_ref: Some(
								k8s_openapi::api::core::v1::SecretKeySelector {
									name: "db-secret".into(),
									key: "password".into(),
									..Default::default()
								},
							),
							..Default::default()
						}),
						..Default::default()
					}]),
					..Default::default()
				}],
				..Default::default()
			}),
			..Default::default()
		};
		assert!(pod_references_config(&pod, "db-secret"));
		assert!(!pod_references_config(&pod, "other-secret"));
	}

	#[test]
	fn pvc_mount_path_resolves_through_the_volume() {
		let pod = Pod {
			spec: Some(PodSpec {
				containers: vec![Container {
					name: "app".into(),
					volume_mounts: Some(vec![VolumeMount {
						name: "data".into(),
						mount_path: "/var/data".into(),
						..Default::default()
					}]),
					..Default::default()
				}],
				volumes: Some(vec![Volume {
					name: "data".into(),
					persistent_volume_claim: Some(
						k8s_openapi::api::core::v1::PersistentVolumeClaimVolumeSource {
							claim_name: "data-claim".into(),
							..Default::default()
						},
					),
					..Default::default()
				}]),
				..Default::default()
			}),
			..Default::default()
		};
		assert_eq!(pvc_mount_path(&pod, "data-claim").as_deref(), Some("/var/data"));
		assert!(pvc_mount_path(&pod, "other-claim").is_none());
	}

	#[test]
	fn probe_kinds_are_checked_per_container() {
		let pod = Pod {
			spec: Some(PodSpec {
				containers: vec![Container {
					name: "app".into(),
					liveness_probe: Some(Probe::default()),
					..Default::default()
				}],
				..Default::default()
			}),
			..Default::default()
		};
		assert!(containers_have_probes(&pod, ProbeKind::Liveness));
		assert!(!containers_have_probes(&pod, ProbeKind::Readiness));
		assert!(!containers_have_probes(&pod, ProbeKind::Both));
	}

	#[test]
	fn ready_condition_must_be_true() {
		let ready = Pod {
			status: Some(PodStatus {
				conditions: Some(vec![PodCondition {
					type_: "Ready".into(),
					status: "True".into(),
					..Default::default()
				}]),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(pod_is_ready(&ready));

		let unready = Pod {
			status: Some(PodStatus {
				conditions: Some(vec![PodCondition {
					type_: "Ready".into(),
					status: "False".into(),
					..Default::default()
				}]),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(!pod_is_ready(&unready));
	}

	#[test]
	fn scaling_requires_spec_and_ready_replicas() {
		let mut deployment = deployment_with_replicas(5);
		deployment.status = Some(DeploymentStatus {
			ready_replicas: Some(4),
			..Default::default()
		});
		assert!(!scaling_matches(&deployment, 5));

		deployment.status = Some(DeploymentStatus {
			ready_replicas: Some(5),
			..Default::default()
		});
		assert!(scaling_matches(&deployment, 5));
		assert!(!scaling_matches(&deployment, 3));
	}

	#[test]
	fn explicit_resource_values_must_match_exactly() {
		let pod = Pod {
			spec: Some(PodSpec {
				containers: vec![Container {
					name: "app".into(),
					resources: Some(ResourceRequirements {
						requests: Some(
							[("cpu", "100m"), ("memory", "128Mi")]
								.into_iter()
								.map(|(k, v)| (k.to_string(), Quantity(v.to_string())))
								.collect(),
						),
						limits: Some(
							[("cpu", "200m"), ("memory", "256Mi")]
								.into_iter()
								.map(|(k, v)| (k.to_string(), Quantity(v.to_string())))
								.collect(),
						),
						..Default::default()
					}),
					..Default::default()
				}],
				..Default::default()
			}),
			..Default::default()
		};

		let exact = ResourceExpectations {
			cpu_request: Some("100m".into()),
			cpu_limit: Some("200m".into()),
			memory_request: Some("128Mi".into()),
			memory_limit: Some("256Mi".into()),
		};
		assert!(resources_match(&pod, &exact));

		let wrong = ResourceExpectations {
			cpu_limit: Some("500m".into()),
			..Default::default()
		};
		assert!(!resources_match(&pod, &wrong));

		// Empty expectation: any declared requests or limits suffice.
		assert!(resources_match(&pod, &ResourceExpectations::default()));

		let bare = Pod {
			spec: Some(PodSpec {
				containers: vec![Container {
					name: "app".into(),
					..Default::default()
				}],
				..Default::default()
			}),
			..Default::default()
		};
		assert!(!resources_match(&bare, &ResourceExpectations::default()));
	}

	#[test]
	fn template_limits_name_the_offending_container() {
		let deployment = deployment_with_replicas(1);
		// Template has no containers at all.
		assert!(template_containers_have_limits(&deployment).is_err());

		let mut with_limits = deployment_with_replicas(1);
		with_limits.spec.as_mut().unwrap().template.spec = Some(PodSpec {
			containers: vec![Container {
				name: "app".into(),
				resources: Some(ResourceRequirements {
					limits: Some(
						[("cpu".to_string(), Quantity("200m".into()))].into_iter().collect(),
					),
					..Default::default()
				}),
				..Default::default()
			}],
			..Default::default()
		});
		assert!(template_containers_have_limits(&with_limits).is_ok());
	}

	#[test]
	fn selector_template_coherence() {
		let deployment = deployment_with_replicas(1);
		assert!(selector_matches_template(&deployment).is_ok());

		let mut mismatched = deployment_with_replicas(1);
		mismatched
			.spec
			.as_mut()
			.unwrap()
			.template
			.metadata
			.as_mut()
			.unwrap()
			.labels = Some(labels(&[("app", "other")]));
		let err = selector_matches_template(&mismatched).unwrap_err();
		assert!(err.contains("app=web"));
	}
}
