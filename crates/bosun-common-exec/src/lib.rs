// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bounded-timeout process execution.
//!
//! Validation checks shell out to `kubectl`, `minikube` and `docker`; this
//! crate runs one external command per call, captures stdout/stderr and the
//! exit status, and enforces a caller-supplied timeout. A non-zero exit code
//! is returned as data, not as an error, so callers can match on command
//! output regardless of status.

mod error;

pub use error::ExecError;

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

/// Captured output of one completed process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecOutput {
	pub stdout: String,
	pub stderr: String,
	/// Exit code of the process; `-1` when terminated by a signal.
	pub exit_code: i32,
}

impl ExecOutput {
	/// Returns true if the process exited with status zero.
	pub fn success(&self) -> bool {
		self.exit_code == 0
	}
}

/// Run `command` through the platform shell with a bounded timeout.
///
/// The command string is passed to `cmd /C` on Windows and `sh -c`
/// elsewhere. One OS process is spawned per call; if the timeout elapses the
/// child is killed and [`ExecError::Timeout`] is returned.
pub async fn run(command: &str, timeout: Duration) -> Result<ExecOutput, ExecError> {
	let mut cmd = shell_command(command);
	cmd.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true);

	debug!(command, timeout_ms = timeout.as_millis() as u64, "spawning process");

	let output = match tokio::time::timeout(timeout, cmd.output()).await {
		Ok(result) => result.map_err(|source| ExecError::Spawn { source })?,
		Err(_) => {
			warn!(command, timeout_ms = timeout.as_millis() as u64, "process timed out");
			return Err(ExecError::Timeout { timeout });
		}
	};

	let result = ExecOutput {
		stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
		stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
		exit_code: output.status.code().unwrap_or(-1),
	};

	debug!(
		command,
		exit_code = result.exit_code,
		stdout_bytes = result.stdout.len(),
		"process completed"
	);

	Ok(result)
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
	let mut cmd = Command::new("cmd");
	cmd.args(["/C", command]);
	cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
	let mut cmd = Command::new("sh");
	cmd.args(["-c", command]);
	cmd
}

#[cfg(test)]
mod tests {
	use super::*;

	#[cfg(unix)]
	#[tokio::test]
	async fn captures_stdout_and_zero_exit() {
		let out = run("echo hello", Duration::from_secs(5)).await.unwrap();
		assert_eq!(out.stdout.trim(), "hello");
		assert_eq!(out.exit_code, 0);
		assert!(out.success());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn non_zero_exit_is_returned_not_thrown() {
		let out = run("exit 3", Duration::from_secs(5)).await.unwrap();
		assert_eq!(out.exit_code, 3);
		assert!(!out.success());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn captures_stderr() {
		let out = run("echo oops >&2", Duration::from_secs(5)).await.unwrap();
		assert_eq!(out.stderr.trim(), "oops");
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn timeout_kills_the_child() {
		let err = run("sleep 10", Duration::from_millis(100)).await.unwrap_err();
		assert!(matches!(err, ExecError::Timeout { .. }));
	}

	#[tokio::test]
	async fn unknown_command_reports_failure() {
		// The shell itself runs, so a missing executable surfaces as a
		// non-zero exit with diagnostics on stderr.
		let out = run("bosun-no-such-binary-xyz", Duration::from_secs(5))
			.await
			.unwrap();
		assert_ne!(out.exit_code, 0);
	}
}
