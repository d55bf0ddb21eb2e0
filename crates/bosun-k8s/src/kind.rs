// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
	ConfigMap, Namespace, PersistentVolumeClaim, Pod, Secret, Service,
};
use kube::api::ApiResource;

use crate::error::K8sError;

/// The closed set of resource kinds the validation engine works with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
	Pod,
	Deployment,
	Service,
	ConfigMap,
	Secret,
	PersistentVolumeClaim,
	Namespace,
}

impl ResourceKind {
	/// The dynamic API resource descriptor for this kind.
	pub fn api_resource(&self) -> ApiResource {
		match self {
			ResourceKind::Pod => ApiResource::erase::<Pod>(&()),
			ResourceKind::Deployment => ApiResource::erase::<Deployment>(&()),
			ResourceKind::Service => ApiResource::erase::<Service>(&()),
			ResourceKind::ConfigMap => ApiResource::erase::<ConfigMap>(&()),
			ResourceKind::Secret => ApiResource::erase::<Secret>(&()),
			ResourceKind::PersistentVolumeClaim => ApiResource::erase::<PersistentVolumeClaim>(&()),
			ResourceKind::Namespace => ApiResource::erase::<Namespace>(&()),
		}
	}

	/// Whether the kind lives inside a namespace.
	pub fn is_namespaced(&self) -> bool {
		!matches!(self, ResourceKind::Namespace)
	}
}

impl FromStr for ResourceKind {
	type Err = K8sError;

	/// Parse a kind name as authored in exercise criteria.
	///
	/// Unknown names are a caller defect and surface as
	/// [`K8sError::UnsupportedKind`], never as "not found".
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"pod" | "pods" => Ok(ResourceKind::Pod),
			"deployment" | "deployments" => Ok(ResourceKind::Deployment),
			"service" | "services" | "svc" => Ok(ResourceKind::Service),
			"configmap" | "configmaps" => Ok(ResourceKind::ConfigMap),
			"secret" | "secrets" => Ok(ResourceKind::Secret),
			"persistentvolumeclaim" | "persistentvolumeclaims" | "pvc" => {
				Ok(ResourceKind::PersistentVolumeClaim)
			}
			"namespace" | "namespaces" => Ok(ResourceKind::Namespace),
			other => Err(K8sError::UnsupportedKind { kind: other.into() }),
		}
	}
}

impl fmt::Display for ResourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ResourceKind::Pod => "pod",
			ResourceKind::Deployment => "deployment",
			ResourceKind::Service => "service",
			ResourceKind::ConfigMap => "configmap",
			ResourceKind::Secret => "secret",
			ResourceKind::PersistentVolumeClaim => "persistentvolumeclaim",
			ResourceKind::Namespace => "namespace",
		};
		f.write_str(name)
	}
}
