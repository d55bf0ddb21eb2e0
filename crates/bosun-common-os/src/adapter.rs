// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use tracing::trace;

use crate::platform::{Platform, ShellKind};

/// Executables that carry an `.exe` suffix on Windows.
const EXE_TOOLS: &[&str] = &["kubectl", "minikube", "docker"];

/// Rewrites tool invocations and paths for one platform.
///
/// Adaptation is idempotent: re-adapting output that contains no further
/// OS-specific tokens yields the same string.
pub trait CommandAdapter: Send + Sync {
	/// The platform this adapter targets.
	fn platform(&self) -> Platform;

	/// Rewrite a command line for the target platform and shell.
	///
	/// Literal URLs (any token containing `://`) are never rewritten.
	fn adapt_command(&self, command: &str) -> String;

	/// Rewrite path separators, preserving every segment.
	fn adapt_path(&self, path: &str) -> String;
}

/// Adapter for Windows under either `cmd` or PowerShell.
pub struct WindowsAdapter {
	shell: ShellKind,
}

impl CommandAdapter for WindowsAdapter {
	fn platform(&self) -> Platform {
		Platform::Windows
	}

	fn adapt_command(&self, command: &str) -> String {
		let adapted = command
			.split(' ')
			.map(|token| self.adapt_token(token))
			.collect::<Vec<_>>()
			.join(" ");
		let adapted = if self.shell == ShellKind::PowerShell {
			rewrite_env_vars(&adapted)
		} else {
			adapted
		};
		trace!(original = command, adapted = %adapted, "adapted command for windows");
		adapted
	}

	fn adapt_path(&self, path: &str) -> String {
		if path.contains("://") {
			return path.to_string();
		}
		path.replace('/', "\\")
	}
}

impl WindowsAdapter {
	fn adapt_token(&self, token: &str) -> String {
		if EXE_TOOLS.contains(&token) {
			return format!("{token}.exe");
		}
		// URLs keep their forward slashes; flag tokens are left for the
		// tool itself to interpret.
		if token.contains("://") || token.starts_with('-') {
			return token.to_string();
		}
		if token.contains('/') {
			return token.replace('/', "\\");
		}
		token.to_string()
	}
}

/// Adapter for macOS. Commands are authored in POSIX form already, so only
/// stray Windows separators are normalized.
pub struct MacOsAdapter;

impl CommandAdapter for MacOsAdapter {
	fn platform(&self) -> Platform {
		Platform::MacOs
	}

	fn adapt_command(&self, command: &str) -> String {
		command.to_string()
	}

	fn adapt_path(&self, path: &str) -> String {
		if path.contains("://") {
			return path.to_string();
		}
		path.replace('\\', "/")
	}
}

/// Adapter for Linux. Same rules as macOS.
pub struct LinuxAdapter;

impl CommandAdapter for LinuxAdapter {
	fn platform(&self) -> Platform {
		Platform::Linux
	}

	fn adapt_command(&self, command: &str) -> String {
		command.to_string()
	}

	fn adapt_path(&self, path: &str) -> String {
		if path.contains("://") {
			return path.to_string();
		}
		path.replace('\\', "/")
	}
}

/// Rewrite `$VAR` references to PowerShell's `$env:VAR` form.
///
/// Already-rewritten `$env:VAR` references are copied through untouched so
/// the rewrite can be applied twice safely.
fn rewrite_env_vars(command: &str) -> String {
	let mut out = String::with_capacity(command.len() + 8);
	let mut rest = command;
	while let Some(pos) = rest.find('$') {
		out.push_str(&rest[..pos]);
		let tail = &rest[pos..];
		if tail.starts_with("$env:") {
			out.push_str("$env:");
			rest = &tail["$env:".len()..];
			continue;
		}
		let ident_len = tail[1..]
			.chars()
			.take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
			.count();
		if ident_len > 0 && !tail[1..].starts_with(|c: char| c.is_ascii_digit()) {
			out.push_str("$env:");
			out.push_str(&tail[1..1 + ident_len]);
			rest = &tail[1 + ident_len..];
		} else {
			out.push('$');
			rest = &tail[1..];
		}
	}
	out.push_str(rest);
	out
}

/// Build the adapter for an explicit platform/shell pair.
pub fn adapter_for(platform: Platform, shell: ShellKind) -> Box<dyn CommandAdapter> {
	match platform {
		Platform::Windows => Box::new(WindowsAdapter { shell }),
		Platform::MacOs => Box::new(MacOsAdapter),
		Platform::Linux => Box::new(LinuxAdapter),
	}
}

/// Build the adapter for the host platform and shell.
pub fn host_adapter() -> Box<dyn CommandAdapter> {
	adapter_for(Platform::current(), ShellKind::current())
}
