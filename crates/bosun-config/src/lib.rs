// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Centralized configuration for the Bosun validation engine.
//!
//! This crate provides:
//! - Layered configuration with explicit precedence (built-in defaults,
//!   then `BOSUN_ENGINE_*` environment variables)
//! - Type-safe timeouts and retry tuning with validation — a malformed
//!   value is an error, never a silent fallback
//!
//! # Usage
//!
//! ```ignore
//! let config = bosun_config::load_config()?;
//! println!("validation timeout: {:?}", config.validation_timeout);
//! ```

mod error;

pub use error::ConfigError;

use std::time::Duration;

use bosun_common_http::RetryConfig;
use tracing::debug;

const ENV_PREFIX: &str = "BOSUN_ENGINE_";

/// Fully resolved engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
	/// Bound for one command-based validation check.
	pub validation_timeout: Duration,
	/// Bound for one in-pod exec, tuned independently of per-check
	/// validation.
	pub exec_timeout: Duration,
	pub retry: RetrySettings,
}

impl EngineConfig {
	/// The retry configuration for transient-failure wrapping.
	pub fn retry_config(&self) -> RetryConfig {
		RetryConfig {
			max_retries: self.retry.max_retries,
			initial_delay: self.retry.initial_delay,
			backoff_multiplier: self.retry.backoff_multiplier,
			..RetryConfig::default()
		}
	}
}

impl Default for EngineConfig {
	fn default() -> Self {
		finalize(DefaultsSource.load())
	}
}

/// Retry tuning for transient failures.
#[derive(Clone, Debug, PartialEq)]
pub struct RetrySettings {
	pub max_retries: u32,
	pub initial_delay: Duration,
	pub backoff_multiplier: f64,
}

/// One partial configuration contributed by a source.
#[derive(Clone, Debug, Default)]
pub struct EngineConfigLayer {
	pub validation_timeout_ms: Option<u64>,
	pub exec_timeout_ms: Option<u64>,
	pub retry_max_retries: Option<u32>,
	pub retry_initial_delay_ms: Option<u64>,
	pub retry_backoff_multiplier: Option<f64>,
}

impl EngineConfigLayer {
	/// Overlay `other` on top of this layer; set fields win.
	pub fn merge(&mut self, other: EngineConfigLayer) {
		if other.validation_timeout_ms.is_some() {
			self.validation_timeout_ms = other.validation_timeout_ms;
		}
		if other.exec_timeout_ms.is_some() {
			self.exec_timeout_ms = other.exec_timeout_ms;
		}
		if other.retry_max_retries.is_some() {
			self.retry_max_retries = other.retry_max_retries;
		}
		if other.retry_initial_delay_ms.is_some() {
			self.retry_initial_delay_ms = other.retry_initial_delay_ms;
		}
		if other.retry_backoff_multiplier.is_some() {
			self.retry_backoff_multiplier = other.retry_backoff_multiplier;
		}
	}
}

/// Built-in defaults, always the lowest-precedence layer.
pub struct DefaultsSource;

impl DefaultsSource {
	pub fn load(&self) -> EngineConfigLayer {
		EngineConfigLayer {
			validation_timeout_ms: Some(30_000),
			exec_timeout_ms: Some(20_000),
			retry_max_retries: Some(3),
			retry_initial_delay_ms: Some(500),
			retry_backoff_multiplier: Some(2.0),
		}
	}
}

/// `BOSUN_ENGINE_*` environment variables.
pub struct EnvSource;

impl EnvSource {
	pub fn load(&self) -> Result<EngineConfigLayer, ConfigError> {
		Self::load_from(|name| std::env::var(name).ok())
	}

	/// Load from an arbitrary variable lookup, for tests.
	pub fn load_from(
		lookup: impl Fn(&str) -> Option<String>,
	) -> Result<EngineConfigLayer, ConfigError> {
		let mut layer = EngineConfigLayer::default();
		layer.validation_timeout_ms = parse_var(&lookup, "VALIDATION_TIMEOUT_MS")?;
		layer.exec_timeout_ms = parse_var(&lookup, "EXEC_TIMEOUT_MS")?;
		layer.retry_max_retries = parse_var(&lookup, "RETRY_MAX_RETRIES")?;
		layer.retry_initial_delay_ms = parse_var(&lookup, "RETRY_INITIAL_DELAY_MS")?;
		layer.retry_backoff_multiplier = parse_var(&lookup, "RETRY_BACKOFF_MULTIPLIER")?;
		Ok(layer)
	}
}

fn parse_var<T: std::str::FromStr>(
	lookup: &impl Fn(&str) -> Option<String>,
	suffix: &str,
) -> Result<Option<T>, ConfigError>
where
	T::Err: std::fmt::Display,
{
	let variable = format!("{ENV_PREFIX}{suffix}");
	match lookup(&variable) {
		None => Ok(None),
		Some(raw) => raw
			.trim()
			.parse::<T>()
			.map(Some)
			.map_err(|err| ConfigError::invalid(&variable, &raw, err.to_string())),
	}
}

/// Load configuration with standard precedence: defaults, then environment.
pub fn load_config() -> Result<EngineConfig, ConfigError> {
	let mut merged = DefaultsSource.load();
	debug!(source = "defaults", "loaded configuration layer");
	merged.merge(EnvSource.load()?);
	debug!(source = "env", "loaded configuration layer");
	Ok(finalize(merged))
}

fn finalize(layer: EngineConfigLayer) -> EngineConfig {
	// Defaults populate every field, so the unwraps here cannot fire; keep
	// them out of the public surface regardless.
	EngineConfig {
		validation_timeout: Duration::from_millis(layer.validation_timeout_ms.unwrap_or(30_000)),
		exec_timeout: Duration::from_millis(layer.exec_timeout_ms.unwrap_or(20_000)),
		retry: RetrySettings {
			max_retries: layer.retry_max_retries.unwrap_or(3),
			initial_delay: Duration::from_millis(layer.retry_initial_delay_ms.unwrap_or(500)),
			backoff_multiplier: layer.retry_backoff_multiplier.unwrap_or(2.0),
		},
	}
}
