// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when spawning an external process.
#[derive(Error, Debug)]
pub enum ExecError {
	#[error("process exceeded timeout of {timeout:?}")]
	Timeout { timeout: Duration },

	#[error("failed to spawn process: {source}")]
	Spawn {
		#[source]
		source: std::io::Error,
	},
}
