// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Executes exactly one validation check and renders its detail line.

use std::sync::Arc;
use std::time::Duration;

use bosun_common_exec::ExecError;
use bosun_common_http::{ExpectedResponse, ProbeClient};
use bosun_common_os::CommandAdapter;
use reqwest::Method;
use tracing::debug;

use crate::criteria::ValidationCheck;
use crate::registry::{CheckContext, ValidatorRegistry};
use crate::result::{FAIL, PASS};

/// Outcome of one executed check.
pub(crate) struct CheckOutcome {
	pub passed: bool,
	/// The one guaranteed detail line for this check.
	pub detail: String,
	/// Additional lines (stderr excerpts and the like) on failure.
	pub extra: Vec<String>,
}

impl CheckOutcome {
	fn pass(subject: &str) -> Self {
		Self {
			passed: true,
			detail: format!("{PASS} {subject}"),
			extra: Vec::new(),
		}
	}

	fn fail(subject: &str, reason: impl Into<String>) -> Self {
		Self {
			passed: false,
			detail: format!("{FAIL} {subject}: {}", reason.into()),
			extra: Vec::new(),
		}
	}

	fn with_extra(mut self, line: String) -> Self {
		self.extra.push(line);
		self
	}
}

/// Runs individual checks; shared by the orchestrator across steps.
pub(crate) struct CheckRunner {
	adapter: Box<dyn CommandAdapter>,
	probe: ProbeClient,
	registry: Arc<ValidatorRegistry>,
	check_timeout: Duration,
}

impl CheckRunner {
	pub fn new(
		adapter: Box<dyn CommandAdapter>,
		probe: ProbeClient,
		registry: Arc<ValidatorRegistry>,
		check_timeout: Duration,
	) -> Self {
		Self {
			adapter,
			probe,
			registry,
			check_timeout,
		}
	}

	/// Execute one check. Never returns an error: anything that goes wrong
	/// becomes a failed detail line, so sibling checks always run.
	pub async fn run(&self, check: &ValidationCheck, ctx: &CheckContext) -> CheckOutcome {
		match check {
			ValidationCheck::Command {
				command,
				expected_output,
			} => self.run_command(command, expected_output.as_deref()).await,
			ValidationCheck::Http {
				url,
				method,
				expected,
			} => self.run_http(url, method.as_deref(), expected).await,
			ValidationCheck::Custom { validator } => self.run_custom(validator, ctx).await,
		}
	}

	async fn run_command(&self, command: &str, expected_output: Option<&str>) -> CheckOutcome {
		let adapted = self.adapter.adapt_command(command);
		debug!(command = %adapted, "running command check");

		let output = match bosun_common_exec::run(&adapted, self.check_timeout).await {
			Ok(output) => output,
			Err(ExecError::Timeout { timeout }) => {
				return CheckOutcome::fail(command, format!("timed out after {timeout:?}"));
			}
			Err(err) => return CheckOutcome::fail(command, err.to_string()),
		};

		match expected_output {
			Some(expected) => {
				if output.stdout.contains(expected) {
					CheckOutcome::pass(command)
				} else {
					let outcome =
						CheckOutcome::fail(command, format!("output did not contain {expected:?}"));
					let trimmed = output.stdout.trim();
					if trimmed.is_empty() {
						outcome
					} else {
						outcome.with_extra(format!("  stdout: {}", first_line(trimmed)))
					}
				}
			}
			None => {
				if output.success() {
					CheckOutcome::pass(command)
				} else {
					let outcome =
						CheckOutcome::fail(command, format!("exit code {}", output.exit_code));
					let trimmed = output.stderr.trim();
					if trimmed.is_empty() {
						outcome
					} else {
						outcome.with_extra(format!("  stderr: {}", first_line(trimmed)))
					}
				}
			}
		}
	}

	async fn run_http(
		&self,
		url: &str,
		method: Option<&str>,
		expected: &ExpectedResponse,
	) -> CheckOutcome {
		let subject = format!("{} {}", method.unwrap_or("GET"), url);

		if expected.is_empty() {
			return if self.probe.is_service_accessible(url).await {
				CheckOutcome::pass(&subject)
			} else {
				CheckOutcome::fail(&subject, "service is not reachable")
			};
		}

		// An explicit non-GET method narrows the probe to status and body;
		// header matching is a GET concern. A header expectation on another
		// method is an authoring mistake and fails before any request.
		let resolved = method_of(method);
		if resolved != Method::GET && expected.headers.is_some() {
			return CheckOutcome::fail(
				&subject,
				"header expectations require the GET method",
			);
		}
		let passed = if resolved == Method::GET {
			self.probe.validate_service_endpoint(url, expected).await
		} else {
			let status = expected.status_code.unwrap_or(200);
			self.probe
				.validate_api_endpoint(url, resolved, status, expected.body.as_ref())
				.await
		};

		if passed {
			CheckOutcome::pass(&subject)
		} else {
			CheckOutcome::fail(&subject, "response did not match the expectation")
		}
	}

	async fn run_custom(&self, validator_id: &str, ctx: &CheckContext) -> CheckOutcome {
		let Some(validator) = self.registry.get(validator_id) else {
			return CheckOutcome::fail(
				&format!("custom check '{validator_id}'"),
				"no such validator is registered",
			);
		};

		let subject = format!("custom check '{}'", validator.id());
		match validator.validate(ctx).await {
			Ok(true) => CheckOutcome::pass(&subject),
			Ok(false) => CheckOutcome::fail(&subject, validator.description()),
			// A throwing custom validator is a failed check, not an engine
			// error.
			Err(err) => CheckOutcome::fail(&subject, err.to_string()),
		}
	}
}

fn method_of(method: Option<&str>) -> Method {
	method
		.and_then(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
		.unwrap_or(Method::GET)
}

fn first_line(text: &str) -> &str {
	text.lines().next().unwrap_or(text)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn method_parsing_defaults_to_get() {
		assert_eq!(method_of(None), Method::GET);
		assert_eq!(method_of(Some("post")), Method::POST);
		assert_eq!(method_of(Some("DELETE")), Method::DELETE);
		assert_eq!(method_of(Some("not a method")), Method::GET);
	}

	#[tokio::test]
	async fn non_get_checks_reject_header_expectations() {
		use std::collections::HashMap;

		use crate::testutil::{MockCluster, MockDocker};

		let runner = CheckRunner::new(
			bosun_common_os::host_adapter(),
			ProbeClient::new(Duration::from_secs(1)),
			Arc::new(ValidatorRegistry::new()),
			Duration::from_secs(1),
		);
		let ctx = CheckContext {
			step_id: "step".to_string(),
			cluster: Arc::new(MockCluster::up()),
			docker: Arc::new(MockDocker::up()),
			http: ProbeClient::new(Duration::from_secs(1)),
		};
		// The URL is unroutable; the check must fail on the expectation
		// shape alone, without issuing a request.
		let check = ValidationCheck::Http {
			url: "http://127.0.0.1:9".to_string(),
			method: Some("POST".to_string()),
			expected: ExpectedResponse {
				headers: Some(HashMap::from([(
					"content-type".to_string(),
					"application/json".to_string(),
				)])),
				..Default::default()
			},
		};

		let outcome = runner.run(&check, &ctx).await;
		assert!(!outcome.passed);
		assert!(outcome.detail.contains("GET"));
	}

	#[test]
	fn outcome_lines_carry_glyphs() {
		let pass = CheckOutcome::pass("kubectl get pods");
		assert!(pass.detail.starts_with(PASS));
		let fail = CheckOutcome::fail("kubectl get pods", "exit code 1");
		assert!(fail.detail.starts_with(FAIL));
		assert!(fail.detail.contains("exit code 1"));
	}
}
