// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-memory cluster and image clients for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bosun_docker::{BuildResult, DockerError, DockerResult, ImageClient, ImageInfo};
use bosun_k8s::{ClusterClient, K8sError, K8sResult, ResourceKind};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
	ConfigMap, Namespace, PersistentVolumeClaim, Pod, Service,
};
use kube::core::DynamicObject;

fn key(namespace: &str, name: &str) -> (String, String) {
	(namespace.to_string(), name.to_string())
}

/// A cluster client backed by in-memory maps.
#[derive(Default)]
pub(crate) struct MockCluster {
	available: bool,
	error: Option<String>,
	probes: Arc<AtomicU32>,
	pub deployments: HashMap<(String, String), Deployment>,
	/// Pods per namespace, listed with label-selector filtering.
	pub pods: HashMap<String, Vec<Pod>>,
	pub config_maps: HashMap<(String, String), ConfigMap>,
	/// Raw secrets, as the dynamic API would return them.
	pub secrets: HashMap<(String, String), DynamicObject>,
	pub pvcs: HashMap<(String, String), PersistentVolumeClaim>,
	pub services: HashMap<(String, String), Service>,
	pub namespaces: HashSet<String>,
	/// `(needle, stdout)` pairs; exec answers with the first pair whose
	/// needle occurs in the joined command.
	pub exec_responses: Vec<(String, String)>,
}

impl MockCluster {
	pub fn up() -> Self {
		Self {
			available: true,
			..Default::default()
		}
	}

	pub fn down(error: &str) -> Self {
		Self {
			available: false,
			error: Some(error.to_string()),
			..Default::default()
		}
	}

	pub fn probe_counter(&self) -> Arc<AtomicU32> {
		Arc::clone(&self.probes)
	}

	pub fn with_deployment(mut self, namespace: &str, name: &str, deployment: Deployment) -> Self {
		self.deployments.insert(key(namespace, name), deployment);
		self
	}

	pub fn with_pods(mut self, namespace: &str, pods: Vec<Pod>) -> Self {
		self.pods.insert(namespace.to_string(), pods);
		self
	}

	pub fn with_config_map(mut self, namespace: &str, name: &str, config_map: ConfigMap) -> Self {
		self.config_maps.insert(key(namespace, name), config_map);
		self
	}

	pub fn with_secret(mut self, namespace: &str, name: &str, secret: DynamicObject) -> Self {
		self.secrets.insert(key(namespace, name), secret);
		self
	}

	pub fn with_pvc(
		mut self,
		namespace: &str,
		name: &str,
		pvc: PersistentVolumeClaim,
	) -> Self {
		self.pvcs.insert(key(namespace, name), pvc);
		self
	}

	pub fn with_service(mut self, namespace: &str, name: &str, service: Service) -> Self {
		self.services.insert(key(namespace, name), service);
		self
	}

	pub fn with_namespace(mut self, name: &str) -> Self {
		self.namespaces.insert(name.to_string());
		self
	}

	pub fn with_exec_response(mut self, needle: &str, stdout: &str) -> Self {
		self.exec_responses
			.push((needle.to_string(), stdout.to_string()));
		self
	}

	fn pod_matches(pod: &Pod, selector: &str) -> bool {
		let labels = pod.metadata.labels.as_ref();
		selector.split(',').all(|pair| {
			let Some((k, v)) = pair.split_once('=') else {
				return false;
			};
			labels.is_some_and(|labels| labels.get(k).map(String::as_str) == Some(v))
		})
	}
}

#[async_trait]
impl ClusterClient for MockCluster {
	async fn is_available(&self) -> bool {
		self.probes.fetch_add(1, Ordering::SeqCst);
		self.available
	}

	async fn get_resource(
		&self,
		kind: ResourceKind,
		name: &str,
		namespace: &str,
	) -> K8sResult<Option<DynamicObject>> {
		match kind {
			ResourceKind::Secret => Ok(self.secrets.get(&key(namespace, name)).cloned()),
			_ => Ok(None),
		}
	}

	async fn list_resources(
		&self,
		kind: ResourceKind,
		namespace: Option<&str>,
	) -> K8sResult<Vec<DynamicObject>> {
		if kind != ResourceKind::Service {
			return Ok(Vec::new());
		}
		let ar = kind.api_resource();
		Ok(self
			.services
			.keys()
			.filter(|(ns, _)| namespace.map_or(true, |want| ns == want))
			.map(|(_, name)| DynamicObject::new(name, &ar))
			.collect())
	}

	async fn get_deployment(&self, name: &str, namespace: &str) -> K8sResult<Option<Deployment>> {
		Ok(self.deployments.get(&key(namespace, name)).cloned())
	}

	async fn get_pod(&self, name: &str, namespace: &str) -> K8sResult<Option<Pod>> {
		Ok(self
			.pods
			.get(namespace)
			.and_then(|pods| {
				pods.iter()
					.find(|pod| pod.metadata.name.as_deref() == Some(name))
			})
			.cloned())
	}

	async fn list_pods(&self, namespace: &str, label_selector: Option<&str>) -> K8sResult<Vec<Pod>> {
		let pods = self.pods.get(namespace).cloned().unwrap_or_default();
		Ok(match label_selector {
			None => pods,
			Some(selector) => pods
				.into_iter()
				.filter(|pod| Self::pod_matches(pod, selector))
				.collect(),
		})
	}

	async fn get_config_map(&self, name: &str, namespace: &str) -> K8sResult<Option<ConfigMap>> {
		Ok(self.config_maps.get(&key(namespace, name)).cloned())
	}

	async fn get_secret(&self, name: &str, namespace: &str) -> K8sResult<Option<DynamicObject>> {
		Ok(self.secrets.get(&key(namespace, name)).cloned())
	}

	async fn get_pvc(
		&self,
		name: &str,
		namespace: &str,
	) -> K8sResult<Option<PersistentVolumeClaim>> {
		Ok(self.pvcs.get(&key(namespace, name)).cloned())
	}

	async fn get_service(&self, name: &str, namespace: &str) -> K8sResult<Option<Service>> {
		Ok(self.services.get(&key(namespace, name)).cloned())
	}

	async fn get_namespace(&self, name: &str) -> K8sResult<Option<Namespace>> {
		Ok(self.namespaces.contains(name).then(Namespace::default))
	}

	async fn exec(&self, pod: &str, _namespace: &str, command: &[String]) -> K8sResult<String> {
		let joined = command.join(" ");
		for (needle, stdout) in &self.exec_responses {
			if joined.contains(needle.as_str()) {
				return Ok(stdout.clone());
			}
		}
		Err(K8sError::Exec {
			message: format!("no canned response for `{joined}` in pod {pod}"),
		})
	}
}

/// An image client backed by a fixed image list.
#[derive(Default)]
pub(crate) struct MockDocker {
	available: bool,
	error: Option<String>,
	probes: Arc<AtomicU32>,
	pub images: Vec<ImageInfo>,
}

impl MockDocker {
	pub fn up() -> Self {
		Self {
			available: true,
			..Default::default()
		}
	}

	pub fn down(error: &str) -> Self {
		Self {
			available: false,
			error: Some(error.to_string()),
			..Default::default()
		}
	}

	pub fn with_image(mut self, id: &str, tags: &[&str]) -> Self {
		self.images.push(ImageInfo {
			id: id.to_string(),
			repo_tags: tags.iter().map(|t| t.to_string()).collect(),
			..Default::default()
		});
		self
	}
}

#[async_trait]
impl ImageClient for MockDocker {
	async fn is_available(&self) -> bool {
		self.probes.fetch_add(1, Ordering::SeqCst);
		self.available
	}

	async fn build_image(
		&self,
		_context: &str,
		_dockerfile: &str,
		tag: &str,
	) -> DockerResult<BuildResult> {
		if !self.available {
			return Err(DockerError::DaemonUnavailable {
				message: self.error.clone().unwrap_or_default(),
			});
		}
		Ok(BuildResult {
			success: true,
			image_id: Some(format!("sha256:{tag}")),
			output: vec![format!("Successfully tagged {tag}")],
		})
	}

	async fn get_image(&self, reference: &str) -> DockerResult<Option<ImageInfo>> {
		Ok(self
			.images
			.iter()
			.find(|image| image.id == reference || image.has_tag(reference))
			.cloned())
	}

	async fn list_images(&self, _filters: &[String]) -> DockerResult<Vec<ImageInfo>> {
		Ok(self.images.clone())
	}
}
