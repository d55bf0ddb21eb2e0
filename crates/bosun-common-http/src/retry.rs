// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Retry logic with exponential backoff for transient failures.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Configuration for retry behavior.
///
/// Total attempts = `1 + max_retries`. The delay before attempt *n* (first
/// retry is *n* = 1) is `initial_delay * backoff_multiplier^(n-1)`, capped
/// at `max_delay`, with ±10% jitter when `jitter` is enabled.
#[derive(Clone, Debug)]
pub struct RetryConfig {
	/// Maximum number of retries after the initial attempt.
	pub max_retries: u32,
	/// Delay before the first retry.
	pub initial_delay: Duration,
	/// Multiplier applied to the delay after each retry.
	pub backoff_multiplier: f64,
	/// Upper bound for any single delay.
	pub max_delay: Duration,
	/// Apply ±10% jitter to each delay.
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: 3,
			initial_delay: Duration::from_millis(500),
			backoff_multiplier: 2.0,
			max_delay: Duration::from_secs(30),
			jitter: false,
		}
	}
}

impl RetryConfig {
	/// A configuration that never retries.
	pub fn none() -> Self {
		Self {
			max_retries: 0,
			..Self::default()
		}
	}

	fn delay_for(&self, retry: u32) -> Duration {
		let base = self.initial_delay.as_secs_f64()
			* self.backoff_multiplier.powi(retry.saturating_sub(1) as i32);
		let capped = base.min(self.max_delay.as_secs_f64());
		let jittered = if self.jitter {
			capped * (0.9 + fastrand::f64() * 0.2)
		} else {
			capped
		};
		Duration::from_secs_f64(jittered)
	}
}

/// Classifies whether an error is worth retrying.
///
/// Implemented here for [`reqwest::Error`]; client crates implement it for
/// their own error types so [`retry`] can be used uniformly.
pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		// Connection refused, reset and DNS failures all surface as
		// connect errors in reqwest.
		if self.is_connect() || self.is_timeout() {
			return true;
		}
		matches!(
			self.status(),
			Some(reqwest::StatusCode::BAD_GATEWAY)
				| Some(reqwest::StatusCode::SERVICE_UNAVAILABLE)
				| Some(reqwest::StatusCode::GATEWAY_TIMEOUT)
		)
	}
}

/// Retry `op` with exponential backoff, classifying via [`RetryableError`].
pub async fn retry<T, E, F, Fut>(config: &RetryConfig, op: F) -> Result<T, E>
where
	E: RetryableError + std::fmt::Display,
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
{
	retry_if(config, |e: &E| e.is_retryable(), op).await
}

/// Retry `op` with exponential backoff and a caller-supplied predicate.
///
/// A non-retryable error propagates immediately with no further attempts.
pub async fn retry_if<T, E, P, F, Fut>(config: &RetryConfig, is_retryable: P, mut op: F) -> Result<T, E>
where
	E: std::fmt::Display,
	P: Fn(&E) -> bool,
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
{
	let mut attempt = 0u32;
	loop {
		attempt += 1;
		match op().await {
			Ok(value) => {
				if attempt > 1 {
					debug!(attempt, "operation succeeded after retry");
				}
				return Ok(value);
			}
			Err(err) => {
				let retries_used = attempt - 1;
				if !is_retryable(&err) || retries_used >= config.max_retries {
					return Err(err);
				}
				let delay = config.delay_for(attempt);
				warn!(
					attempt,
					delay_ms = delay.as_millis() as u64,
					error = %err,
					"transient failure, retrying"
				);
				tokio::time::sleep(delay).await;
			}
		}
	}
}
