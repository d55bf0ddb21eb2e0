// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Cluster and daemon availability cache.
//!
//! Probing a cluster that is down takes seconds; validation runs dozens of
//! checks. [`HealthMonitor`] memoizes one reachability snapshot for both
//! subsystems and re-probes only on explicit request. The cache is
//! constructor-injected state, not a process-wide singleton, so callers and
//! tests own its lifecycle.
//!
//! Snapshots are advisory: concurrent forced refreshes race benignly and the
//! last writer wins.

use std::sync::Arc;

use bosun_common_os::Platform;
use bosun_docker::ImageClient;
use bosun_k8s::ClusterClient;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Reachability of one subsystem.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubsystemHealth {
	pub available: bool,
	pub error: Option<String>,
}

impl SubsystemHealth {
	fn up() -> Self {
		Self {
			available: true,
			error: None,
		}
	}

	fn down(error: impl Into<String>) -> Self {
		Self {
			available: false,
			error: Some(error.into()),
		}
	}
}

/// Point-in-time reachability of the cluster and the container daemon.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HealthSnapshot {
	pub kubernetes: SubsystemHealth,
	pub docker: SubsystemHealth,
	pub overall: bool,
}

/// Memoized availability probe over the cluster and image clients.
pub struct HealthMonitor {
	cluster: Arc<dyn ClusterClient>,
	docker: Arc<dyn ImageClient>,
	snapshot: RwLock<Option<HealthSnapshot>>,
}

impl HealthMonitor {
	pub fn new(cluster: Arc<dyn ClusterClient>, docker: Arc<dyn ImageClient>) -> Self {
		Self {
			cluster,
			docker,
			snapshot: RwLock::new(None),
		}
	}

	/// Return the cached snapshot, probing only when `force_refresh` is set
	/// or no snapshot exists yet.
	pub async fn check_health(&self, force_refresh: bool) -> HealthSnapshot {
		if !force_refresh {
			if let Some(snapshot) = self.snapshot.read().await.clone() {
				debug!(overall = snapshot.overall, "serving cached health snapshot");
				return snapshot;
			}
		}

		let snapshot = self.probe().await;
		*self.snapshot.write().await = Some(snapshot.clone());
		snapshot
	}

	/// Drop the cached snapshot; the next `check_health` re-probes.
	pub async fn clear_cache(&self) {
		*self.snapshot.write().await = None;
		debug!("health snapshot cleared");
	}

	/// Remediation suggestions for the host platform.
	pub fn suggestions(&self, snapshot: &HealthSnapshot) -> Vec<String> {
		suggestions_for(snapshot, Platform::current())
	}

	async fn probe(&self) -> HealthSnapshot {
		let (cluster_up, docker_up) =
			tokio::join!(self.cluster.is_available(), self.docker.is_available());

		let kubernetes = if cluster_up {
			SubsystemHealth::up()
		} else {
			SubsystemHealth::down("cluster did not answer the version probe")
		};
		let docker = if docker_up {
			SubsystemHealth::up()
		} else {
			SubsystemHealth::down("docker daemon did not answer the version probe")
		};

		let snapshot = HealthSnapshot {
			overall: kubernetes.available && docker.available,
			kubernetes,
			docker,
		};
		info!(
			kubernetes = snapshot.kubernetes.available,
			docker = snapshot.docker.available,
			"health probe completed"
		);
		snapshot
	}
}

/// Remediation suggestions for a given platform.
pub fn suggestions_for(snapshot: &HealthSnapshot, platform: Platform) -> Vec<String> {
	let mut suggestions = Vec::new();

	if !snapshot.kubernetes.available {
		suggestions.push("Start your local cluster: minikube start".to_string());
		suggestions.push(
			"Verify the cluster answers: kubectl cluster-info".to_string(),
		);
		if platform == Platform::Windows {
			suggestions.push(
				"Check that kubectl.exe is on your PATH (PowerShell: Get-Command kubectl)"
					.to_string(),
			);
		}
	}

	if !snapshot.docker.available {
		match platform {
			Platform::Windows | Platform::MacOs => {
				suggestions.push("Start Docker Desktop and wait for it to report \"running\"".to_string());
			}
			Platform::Linux => {
				suggestions.push("Start the Docker daemon: sudo systemctl start docker".to_string());
				suggestions.push(
					"Check your user is in the docker group: groups $USER".to_string(),
				);
			}
		}
	}

	suggestions
}
