// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
	ConfigMap, Namespace, PersistentVolumeClaim, Pod, Service,
};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, AttachParams, DynamicObject, ListParams};
use tokio_util::io::ReaderStream;
use tracing::{debug, trace};

use crate::error::{K8sError, K8sResult};
use crate::kind::ResourceKind;

/// Default bound for an in-pod exec.
const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(30);
/// Bound for the cheap availability probe.
const AVAILABILITY_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait abstracting cluster reads and in-pod execution for testability.
///
/// `get_*` methods answer "resource absent" with `Ok(None)`, never with an
/// error; errors mean the question could not be asked.
#[async_trait]
pub trait ClusterClient: Send + Sync {
	/// Cheap reachability probe. The result is memoized by the availability
	/// cache, not here.
	async fn is_available(&self) -> bool;

	/// Fetch one resource by kind, preserving the raw API representation.
	async fn get_resource(
		&self,
		kind: ResourceKind,
		name: &str,
		namespace: &str,
	) -> K8sResult<Option<DynamicObject>>;

	/// List resources of a kind, optionally scoped to a namespace.
	async fn list_resources(
		&self,
		kind: ResourceKind,
		namespace: Option<&str>,
	) -> K8sResult<Vec<DynamicObject>>;

	async fn get_deployment(&self, name: &str, namespace: &str) -> K8sResult<Option<Deployment>>;

	async fn get_pod(&self, name: &str, namespace: &str) -> K8sResult<Option<Pod>>;

	/// List pods in a namespace, optionally filtered by label selector
	/// (`key=value[,key=value]`).
	async fn list_pods(&self, namespace: &str, label_selector: Option<&str>) -> K8sResult<Vec<Pod>>;

	async fn get_config_map(&self, name: &str, namespace: &str) -> K8sResult<Option<ConfigMap>>;

	/// Fetch a secret in its raw API form, so `data` values keep their
	/// base64 encoding for syntax validation.
	async fn get_secret(&self, name: &str, namespace: &str) -> K8sResult<Option<DynamicObject>>;

	async fn get_pvc(
		&self,
		name: &str,
		namespace: &str,
	) -> K8sResult<Option<PersistentVolumeClaim>>;

	async fn get_service(&self, name: &str, namespace: &str) -> K8sResult<Option<Service>>;

	async fn get_namespace(&self, name: &str) -> K8sResult<Option<Namespace>>;

	/// Run a command inside a running pod and return its stdout.
	///
	/// Fails with [`K8sError::PodNotFound`] if the pod does not exist and
	/// [`K8sError::Exec`] if the remote command cannot run or exits
	/// non-zero.
	async fn exec(&self, pod: &str, namespace: &str, command: &[String]) -> K8sResult<String>;
}

/// Cluster client backed by the `kube` API machinery.
pub struct KubeClusterClient {
	client: kube::Client,
	exec_timeout: Duration,
}

impl KubeClusterClient {
	/// Wrap an existing kube client.
	pub fn new(client: kube::Client) -> Self {
		Self {
			client,
			exec_timeout: DEFAULT_EXEC_TIMEOUT,
		}
	}

	/// Connect using the ambient kubeconfig / in-cluster environment.
	pub async fn connect() -> K8sResult<Self> {
		let client = kube::Client::try_default().await?;
		Ok(Self::new(client))
	}

	/// Override the in-pod exec timeout.
	pub fn with_exec_timeout(mut self, timeout: Duration) -> Self {
		self.exec_timeout = timeout;
		self
	}

	async fn get_namespaced<K>(&self, name: &str, namespace: &str) -> K8sResult<Option<K>>
	where
		K: kube::Resource<Scope = NamespaceResourceScope>
			+ Clone
			+ serde::de::DeserializeOwned
			+ std::fmt::Debug,
		K::DynamicType: Default,
	{
		let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
		Ok(api.get_opt(name).await?)
	}

	fn dynamic_api(&self, kind: ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
		let resource = kind.api_resource();
		match namespace {
			Some(ns) if kind.is_namespaced() => {
				Api::namespaced_with(self.client.clone(), ns, &resource)
			}
			_ => Api::all_with(self.client.clone(), &resource),
		}
	}
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
	async fn is_available(&self) -> bool {
		let probe = self.client.apiserver_version();
		match tokio::time::timeout(AVAILABILITY_PROBE_TIMEOUT, probe).await {
			Ok(Ok(version)) => {
				trace!(version = %version.git_version, "cluster reachable");
				true
			}
			Ok(Err(err)) => {
				debug!(error = %err, "cluster probe failed");
				false
			}
			Err(_) => {
				debug!("cluster probe timed out");
				false
			}
		}
	}

	async fn get_resource(
		&self,
		kind: ResourceKind,
		name: &str,
		namespace: &str,
	) -> K8sResult<Option<DynamicObject>> {
		let api = self.dynamic_api(kind, Some(namespace));
		Ok(api.get_opt(name).await?)
	}

	async fn list_resources(
		&self,
		kind: ResourceKind,
		namespace: Option<&str>,
	) -> K8sResult<Vec<DynamicObject>> {
		let api = self.dynamic_api(kind, namespace);
		let list = api.list(&ListParams::default()).await?;
		Ok(list.items)
	}

	async fn get_deployment(&self, name: &str, namespace: &str) -> K8sResult<Option<Deployment>> {
		self.get_namespaced(name, namespace).await
	}

	async fn get_pod(&self, name: &str, namespace: &str) -> K8sResult<Option<Pod>> {
		self.get_namespaced(name, namespace).await
	}

	async fn list_pods(&self, namespace: &str, label_selector: Option<&str>) -> K8sResult<Vec<Pod>> {
		let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
		let mut params = ListParams::default();
		if let Some(selector) = label_selector {
			params = params.labels(selector);
		}
		let list = api.list(&params).await?;
		Ok(list.items)
	}

	async fn get_config_map(&self, name: &str, namespace: &str) -> K8sResult<Option<ConfigMap>> {
		self.get_namespaced(name, namespace).await
	}

	async fn get_secret(&self, name: &str, namespace: &str) -> K8sResult<Option<DynamicObject>> {
		self.get_resource(ResourceKind::Secret, name, namespace).await
	}

	async fn get_pvc(
		&self,
		name: &str,
		namespace: &str,
	) -> K8sResult<Option<PersistentVolumeClaim>> {
		self.get_namespaced(name, namespace).await
	}

	async fn get_service(&self, name: &str, namespace: &str) -> K8sResult<Option<Service>> {
		self.get_namespaced(name, namespace).await
	}

	async fn get_namespace(&self, name: &str) -> K8sResult<Option<Namespace>> {
		let api: Api<Namespace> = Api::all(self.client.clone());
		Ok(api.get_opt(name).await?)
	}

	async fn exec(&self, pod: &str, namespace: &str, command: &[String]) -> K8sResult<String> {
		let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
		if pods.get_opt(pod).await?.is_none() {
			return Err(K8sError::PodNotFound {
				name: pod.to_string(),
			});
		}

		debug!(pod, namespace, ?command, "executing command in pod");

		let params = AttachParams::default().stdout(true).stderr(false);
		let run = async {
			let mut attached = pods.exec(pod, command.to_vec(), &params).await?;
			let status = attached.take_status();

			let stdout = attached.stdout().ok_or_else(|| K8sError::Exec {
				message: "no stdout stream from exec".into(),
			})?;
			let mut reader = ReaderStream::new(stdout);
			let mut output = String::new();
			while let Some(chunk) = reader.next().await {
				let bytes = chunk.map_err(|err| K8sError::Exec {
					message: err.to_string(),
				})?;
				output.push_str(&String::from_utf8_lossy(&bytes));
			}

			if let Some(status) = status {
				if let Some(status) = status.await {
					if status.status.as_deref() == Some("Failure") {
						return Err(K8sError::Exec {
							message: status
								.message
								.unwrap_or_else(|| "remote command failed".into()),
						});
					}
				}
			}
			attached.join().await.map_err(|err| K8sError::Exec {
				message: err.to_string(),
			})?;
			Ok(output)
		};

		match tokio::time::timeout(self.exec_timeout, run).await {
			Ok(result) => result,
			Err(_) => Err(K8sError::Timeout),
		}
	}
}
