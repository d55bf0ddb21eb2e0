// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Endpoint probing with status-code pass-through.
//!
//! Probes never treat a non-2xx status as an error: "is the service
//! reachable at all" and "does it return exactly X" are separate questions,
//! and both are answered from the same raw response.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Expected shape of an HTTP response.
///
/// Absent fields are not checked.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExpectedResponse {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status_code: Option<u16>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub body: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub headers: Option<HashMap<String, String>>,
}

impl ExpectedResponse {
	/// Returns true if no dimension of the response is constrained.
	pub fn is_empty(&self) -> bool {
		self.status_code.is_none() && self.body.is_none() && self.headers.is_none()
	}
}

/// HTTP probe client used by validation checks.
#[derive(Clone)]
pub struct ProbeClient {
	client: Client,
}

impl ProbeClient {
	/// Create a probe client with the given per-request timeout.
	pub fn new(timeout: Duration) -> Self {
		Self {
			client: crate::new_client_with_timeout(timeout),
		}
	}

	/// Create a probe client around an existing reqwest client.
	pub fn with_client(client: Client) -> Self {
		Self { client }
	}

	/// Returns true if the URL answers with any HTTP status at all.
	///
	/// 4xx/5xx responses still count as "accessible"; only network-level
	/// failure (connection refused, timeout, DNS failure) yields false.
	pub async fn is_service_accessible(&self, url: &str) -> bool {
		match self.client.get(url).send().await {
			Ok(response) => {
				debug!(url, status = response.status().as_u16(), "service reachable");
				true
			}
			Err(err) => {
				debug!(url, error = %err, "service not reachable");
				false
			}
		}
	}

	/// Returns true if the endpoint answers with exactly `expected_status`
	/// and, when supplied, a body deep-equal to `expected_body`.
	pub async fn validate_api_endpoint(
		&self,
		url: &str,
		method: Method,
		expected_status: u16,
		expected_body: Option<&Value>,
	) -> bool {
		let response = match self.client.request(method, url).send().await {
			Ok(response) => response,
			Err(err) => {
				debug!(url, error = %err, "api endpoint probe failed");
				return false;
			}
		};

		let status = response.status().as_u16();
		if status != expected_status {
			debug!(url, status, expected_status, "status mismatch");
			return false;
		}

		match expected_body {
			None => true,
			Some(expected) => match response.text().await {
				Ok(text) => body_matches(expected, &text),
				Err(err) => {
					debug!(url, error = %err, "failed to read response body");
					false
				}
			},
		}
	}

	/// Returns true if the endpoint satisfies every constrained dimension of
	/// `expected`.
	///
	/// Header matching is a superset match: every expected header must be
	/// present with the expected value, extra headers are ignored.
	pub async fn validate_service_endpoint(&self, url: &str, expected: &ExpectedResponse) -> bool {
		let response = match self.client.get(url).send().await {
			Ok(response) => response,
			Err(err) => {
				debug!(url, error = %err, "service endpoint probe failed");
				return false;
			}
		};

		if let Some(expected_status) = expected.status_code {
			let status = response.status().as_u16();
			if status != expected_status {
				debug!(url, status, expected_status, "status mismatch");
				return false;
			}
		}

		if let Some(expected_headers) = &expected.headers {
			let headers = response.headers();
			for (name, value) in expected_headers {
				let actual = headers.get(name).and_then(|v| v.to_str().ok());
				if actual != Some(value.as_str()) {
					debug!(url, header = %name, "header mismatch");
					return false;
				}
			}
		}

		match &expected.body {
			None => true,
			Some(expected_body) => match response.text().await {
				Ok(text) => body_matches(expected_body, &text),
				Err(err) => {
					debug!(url, error = %err, "failed to read response body");
					false
				}
			},
		}
	}
}

/// Deep equality between an expected body and raw response text.
///
/// JSON responses are compared structurally; non-JSON responses only match a
/// string expectation with identical text.
fn body_matches(expected: &Value, text: &str) -> bool {
	match serde_json::from_str::<Value>(text) {
		Ok(actual) => &actual == expected,
		Err(_) => matches!(expected, Value::String(s) if s == text),
	}
}
