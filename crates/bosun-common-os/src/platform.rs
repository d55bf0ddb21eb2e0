// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::fmt;

/// Operating system the process is running on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
	Windows,
	MacOs,
	Linux,
}

impl Platform {
	/// Detect the host platform at compile time.
	pub fn current() -> Self {
		if cfg!(target_os = "windows") {
			Platform::Windows
		} else if cfg!(target_os = "macos") {
			Platform::MacOs
		} else {
			Platform::Linux
		}
	}
}

impl fmt::Display for Platform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Platform::Windows => "windows",
			Platform::MacOs => "macos",
			Platform::Linux => "linux",
		};
		f.write_str(name)
	}
}

/// Shell the adapted commands will be executed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShellKind {
	Cmd,
	PowerShell,
	Bash,
	Zsh,
}

impl ShellKind {
	/// Detect the host shell.
	///
	/// On Windows, the presence of `PSModulePath` indicates a PowerShell
	/// session; otherwise `cmd` is assumed. On Unix platforms the `SHELL`
	/// environment variable decides between zsh and bash, defaulting to
	/// bash.
	pub fn current() -> Self {
		match Platform::current() {
			Platform::Windows => {
				if std::env::var_os("PSModulePath").is_some() {
					ShellKind::PowerShell
				} else {
					ShellKind::Cmd
				}
			}
			Platform::MacOs | Platform::Linux => {
				let shell = std::env::var("SHELL").unwrap_or_default();
				if shell.rsplit('/').next() == Some("zsh") {
					ShellKind::Zsh
				} else {
					ShellKind::Bash
				}
			}
		}
	}
}

impl fmt::Display for ShellKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ShellKind::Cmd => "cmd",
			ShellKind::PowerShell => "powershell",
			ShellKind::Bash => "bash",
			ShellKind::Zsh => "zsh",
		};
		f.write_str(name)
	}
}
