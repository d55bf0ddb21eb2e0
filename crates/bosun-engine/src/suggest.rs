// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Failure-text classification into remediation suggestion templates.

/// Suggestion family chosen from the failure text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FailureCategory {
	Cluster,
	Docker,
	Network,
	Validation,
}

/// Classify free-form failure text by keyword.
///
/// Categories are checked in priority order: a message mentioning both the
/// cluster and a timeout gets cluster guidance first.
pub(crate) fn classify(text: &str) -> FailureCategory {
	let text = text.to_ascii_lowercase();
	if text.contains("cluster") || text.contains("kubernetes") || text.contains("kubectl") {
		FailureCategory::Cluster
	} else if text.contains("docker") || text.contains("daemon") || text.contains("image") {
		FailureCategory::Docker
	} else if text.contains("network")
		|| text.contains("timeout")
		|| text.contains("timed out")
		|| text.contains("connection")
		|| text.contains("refused")
		|| text.contains("dns")
	{
		FailureCategory::Network
	} else {
		FailureCategory::Validation
	}
}

/// Remediation suggestions for one failure category.
pub(crate) fn suggestions_for(category: FailureCategory) -> Vec<String> {
	match category {
		FailureCategory::Cluster => vec![
			"Check that your cluster is running: minikube status".to_string(),
			"Verify cluster connectivity: kubectl cluster-info".to_string(),
			"Confirm the resources for this step exist: kubectl get all -n <namespace>".to_string(),
		],
		FailureCategory::Docker => vec![
			"Check that the Docker daemon is running: docker version".to_string(),
			"List local images to confirm the build succeeded: docker images".to_string(),
		],
		FailureCategory::Network => vec![
			"The service may still be starting; wait a few seconds and validate again".to_string(),
			"Check the service endpoints: kubectl get endpoints -n <namespace>".to_string(),
		],
		FailureCategory::Validation => vec![
			"Compare your resources against the exercise instructions and re-apply your manifests"
				.to_string(),
		],
	}
}

/// Suggestions for an aggregate failure, classified from its detail text.
pub(crate) fn for_failure_text(text: &str) -> Vec<String> {
	suggestions_for(classify(text))
}
