// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Domain validators: high-level predicates over live cluster state.
//!
//! Each validator answers one question with a bool. Absent resources answer
//! `false`; only transport-level trouble (after retries) surfaces as an
//! error. Reads retry with the engine's backoff settings, in-pod execs run
//! once.

pub(crate) mod rules;

pub use rules::{ProbeKind, ResourceExpectations};

use bosun_common_http::retry;
use bosun_k8s::{K8sError, ResourceKind};
use tracing::debug;

use crate::error::EngineError;
use crate::orchestrator::ValidationEngine;

/// Token written and read back by the storage persistence probe.
const PERSISTENCE_TOKEN: &str = "persistence-probe";

impl ValidationEngine {
	/// Deployment health: pod count equals the requested replicas and every
	/// pod is `Running`.
	pub async fn validate_deployment_pods(
		&self,
		name: &str,
		namespace: &str,
	) -> Result<bool, EngineError> {
		let retry_config = self.config.retry_config();
		let Some(deployment) = retry(&retry_config, || {
			self.cluster.get_deployment(name, namespace)
		})
		.await?
		else {
			debug!(name, namespace, "deployment not found");
			return Ok(false);
		};

		let selector = deployment
			.spec
			.as_ref()
			.and_then(|spec| rules::selector_string(&spec.selector));
		let pods = retry(&retry_config, || {
			self.cluster.list_pods(namespace, selector.as_deref())
		})
		.await?;

		Ok(rules::deployment_pods_healthy(&deployment, &pods))
	}

	/// The ConfigMap exists and carries every expected key.
	pub async fn validate_config_map(
		&self,
		name: &str,
		namespace: &str,
		expected_keys: &[&str],
	) -> Result<bool, EngineError> {
		let config_map = retry(&self.config.retry_config(), || {
			self.cluster.get_config_map(name, namespace)
		})
		.await?;
		Ok(config_map
			.map(|cm| rules::config_map_has_keys(&cm, expected_keys))
			.unwrap_or(false))
	}

	/// The Secret exists, carries every expected key, and every value is
	/// syntactically valid base64.
	///
	/// Works on the raw API representation; the typed client would decode
	/// the values before we could check their encoding.
	pub async fn validate_secret(
		&self,
		name: &str,
		namespace: &str,
		expected_keys: &[&str],
	) -> Result<bool, EngineError> {
		let secret = retry(&self.config.retry_config(), || {
			self.cluster.get_secret(name, namespace)
		})
		.await?;
		Ok(secret
			.map(|s| rules::secret_data_has_valid_keys(s.data.get("data"), expected_keys))
			.unwrap_or(false))
	}

	/// The PersistentVolumeClaim exists and reports phase `Bound`.
	pub async fn validate_pvc_bound(
		&self,
		name: &str,
		namespace: &str,
	) -> Result<bool, EngineError> {
		let pvc = retry(&self.config.retry_config(), || {
			self.cluster.get_pvc(name, namespace)
		})
		.await?;
		Ok(pvc.map(|p| rules::pvc_is_bound(&p)).unwrap_or(false))
	}

	pub async fn validate_namespace_exists(&self, name: &str) -> Result<bool, EngineError> {
		let namespace = retry(&self.config.retry_config(), || {
			self.cluster.get_namespace(name)
		})
		.await?;
		Ok(namespace.is_some())
	}

	/// Namespace isolation: the service is not listed in the probe
	/// namespace, and its short name does not resolve from a pod there.
	///
	/// DNS is probed with `nslookup <service>` inside `probe_pod`; short
	/// names only resolve within the service's own namespace, so a failed
	/// lookup is the expected, isolated outcome.
	pub async fn validate_namespace_isolation(
		&self,
		service: &str,
		probe_pod: &str,
		probe_namespace: &str,
	) -> Result<bool, EngineError> {
		let services = retry(&self.config.retry_config(), || {
			self.cluster
				.list_resources(ResourceKind::Service, Some(probe_namespace))
		})
		.await?;
		let listed = services
			.iter()
			.any(|obj| obj.metadata.name.as_deref() == Some(service));
		if listed {
			debug!(service, probe_namespace, "service leaked into namespace");
			return Ok(false);
		}

		let lookup = self
			.cluster
			.exec(
				probe_pod,
				probe_namespace,
				&["nslookup".to_string(), service.to_string()],
			)
			.await;
		match lookup {
			// A resolving lookup prints a Name: line; isolation means it
			// must not.
			Ok(output) => Ok(!output.contains("Name:")),
			// nslookup exits non-zero when the name does not resolve.
			Err(K8sError::Exec { .. }) => Ok(true),
			Err(err) => Err(err.into()),
		}
	}

	/// Pod-to-service communication: from `source_pod`, fetch the target
	/// service by cluster DNS name and expect an HTTP response.
	///
	/// Falls back to a DNS resolution check when the pod image has no HTTP
	/// client that reports status lines.
	pub async fn validate_service_communication(
		&self,
		source_pod: &str,
		source_namespace: &str,
		target_service: &str,
		target_namespace: &str,
	) -> Result<bool, EngineError> {
		let fqdn = format!("{target_service}.{target_namespace}.svc.cluster.local");
		let fetch = self
			.cluster
			.exec(
				source_pod,
				source_namespace,
				&[
					"sh".to_string(),
					"-c".to_string(),
					format!(
						"wget -q -S -O /dev/null --timeout=5 http://{fqdn} 2>&1 || true"
					),
				],
			)
			.await;
		match fetch {
			Ok(output) if output.contains("HTTP/") => return Ok(true),
			Ok(_) | Err(K8sError::Exec { .. }) => {}
			Err(err) => return Err(err.into()),
		}

		debug!(%fqdn, "no HTTP response, falling back to DNS resolution");
		let lookup = self
			.cluster
			.exec(
				source_pod,
				source_namespace,
				&["nslookup".to_string(), fqdn],
			)
			.await;
		match lookup {
			Ok(output) => Ok(output.contains("Address")),
			Err(K8sError::Exec { .. }) => Ok(false),
			Err(err) => Err(err.into()),
		}
	}

	/// The pod references the named ConfigMap or Secret, and (optionally)
	/// each expected variable is present in the container environment.
	pub async fn validate_config_mounting(
		&self,
		pod_name: &str,
		namespace: &str,
		config_name: &str,
		expected_env: &[&str],
	) -> Result<bool, EngineError> {
		let Some(pod) = retry(&self.config.retry_config(), || {
			self.cluster.get_pod(pod_name, namespace)
		})
		.await?
		else {
			return Ok(false);
		};
		if !rules::pod_references_config(&pod, config_name) {
			debug!(pod_name, config_name, "pod does not reference config");
			return Ok(false);
		}
		if expected_env.is_empty() {
			return Ok(true);
		}

		let env = self
			.cluster
			.exec(
				pod_name,
				namespace,
				&["sh".to_string(), "-c".to_string(), "env".to_string()],
			)
			.await?;
		Ok(expected_env.iter().all(|name| {
			let prefix = format!("{name}=");
			env.lines().any(|line| line.starts_with(&prefix))
		}))
	}

	/// Storage persistence: the claim is bound, a container mounts it, and
	/// a write to the mount path reads back.
	pub async fn validate_storage_persistence(
		&self,
		pod_name: &str,
		namespace: &str,
		claim: &str,
	) -> Result<bool, EngineError> {
		if !self.validate_pvc_bound(claim, namespace).await? {
			return Ok(false);
		}
		let Some(pod) = retry(&self.config.retry_config(), || {
			self.cluster.get_pod(pod_name, namespace)
		})
		.await?
		else {
			return Ok(false);
		};
		let Some(mount_path) = rules::pvc_mount_path(&pod, claim) else {
			debug!(pod_name, claim, "no container mounts the claim");
			return Ok(false);
		};

		let probe_file = format!("{}/.bosun-probe", mount_path.trim_end_matches('/'));
		let roundtrip = self
			.cluster
			.exec(
				pod_name,
				namespace,
				&[
					"sh".to_string(),
					"-c".to_string(),
					format!("echo {PERSISTENCE_TOKEN} > {probe_file} && cat {probe_file}"),
				],
			)
			.await;
		match roundtrip {
			Ok(output) => Ok(output.contains(PERSISTENCE_TOKEN)),
			Err(K8sError::Exec { .. }) => Ok(false),
			Err(err) => Err(err.into()),
		}
	}

	/// Every container in the pod defines the requested probe kind(s).
	pub async fn validate_health_probes(
		&self,
		pod_name: &str,
		namespace: &str,
		kind: ProbeKind,
	) -> Result<bool, EngineError> {
		let pod = retry(&self.config.retry_config(), || {
			self.cluster.get_pod(pod_name, namespace)
		})
		.await?;
		Ok(pod
			.map(|p| rules::containers_have_probes(&p, kind))
			.unwrap_or(false))
	}

	/// The pod reports a `Ready` condition with status `True`, i.e. it
	/// receives service traffic.
	pub async fn validate_readiness_traffic(
		&self,
		pod_name: &str,
		namespace: &str,
	) -> Result<bool, EngineError> {
		let pod = retry(&self.config.retry_config(), || {
			self.cluster.get_pod(pod_name, namespace)
		})
		.await?;
		Ok(pod.map(|p| rules::pod_is_ready(&p)).unwrap_or(false))
	}

	/// Manual scaling: the deployment requests `expected` replicas and
	/// reports that many ready.
	pub async fn validate_manual_scaling(
		&self,
		name: &str,
		namespace: &str,
		expected: i32,
	) -> Result<bool, EngineError> {
		let deployment = retry(&self.config.retry_config(), || {
			self.cluster.get_deployment(name, namespace)
		})
		.await?;
		Ok(deployment
			.map(|d| rules::scaling_matches(&d, expected))
			.unwrap_or(false))
	}

	/// Resource requests/limits match the expectations; see
	/// [`ResourceExpectations`] for the empty-expectation semantics.
	pub async fn validate_resource_spec(
		&self,
		pod_name: &str,
		namespace: &str,
		expected: &ResourceExpectations,
	) -> Result<bool, EngineError> {
		let pod = retry(&self.config.retry_config(), || {
			self.cluster.get_pod(pod_name, namespace)
		})
		.await?;
		Ok(pod.map(|p| rules::resources_match(&p, expected)).unwrap_or(false))
	}

	/// Every expected image reference resolves to a local image.
	pub async fn validate_image_tags(&self, references: &[&str]) -> Result<bool, EngineError> {
		let retry_config = self.config.retry_config();
		for reference in references {
			let image = retry(&retry_config, || self.docker.get_image(reference)).await?;
			let found = image.is_some_and(|i| i.has_tag(reference) || i.id == *reference);
			if !found {
				debug!(reference, "image not found locally");
				return Ok(false);
			}
		}
		Ok(true)
	}
}
