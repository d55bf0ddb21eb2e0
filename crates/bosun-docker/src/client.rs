// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{DockerError, DockerResult};

/// Default bound for non-build docker invocations. Builds are unbounded;
/// they legitimately take minutes on first run.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Metadata about one local container image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageInfo {
	pub id: String,
	/// `repository:tag` references pointing at this image.
	pub repo_tags: Vec<String>,
	pub created: Option<String>,
	/// Size in bytes; only `docker image inspect` reports it numerically.
	pub size: Option<i64>,
}

impl ImageInfo {
	/// Returns true if the image carries the given `repository:tag`
	/// reference.
	pub fn has_tag(&self, reference: &str) -> bool {
		self.repo_tags.iter().any(|t| t == reference)
	}
}

/// Outcome of an image build.
#[derive(Clone, Debug, Default)]
pub struct BuildResult {
	pub success: bool,
	pub image_id: Option<String>,
	/// Build log lines in arrival order.
	pub output: Vec<String>,
}

/// Trait abstracting image operations for testability.
#[async_trait]
pub trait ImageClient: Send + Sync {
	/// Cheap daemon reachability probe.
	async fn is_available(&self) -> bool;

	/// Build an image from a context directory, streaming the build log.
	async fn build_image(
		&self,
		context: &str,
		dockerfile: &str,
		tag: &str,
	) -> DockerResult<BuildResult>;

	/// Inspect an image by name, tag or id. Absent images are `Ok(None)`.
	async fn get_image(&self, reference: &str) -> DockerResult<Option<ImageInfo>>;

	/// List local images, optionally filtered (`dangling=true`,
	/// `reference=web*`, ...).
	async fn list_images(&self, filters: &[String]) -> DockerResult<Vec<ImageInfo>>;
}

/// Image client implementation using the docker CLI.
pub struct CommandDockerClient {
	command_timeout: Duration,
}

impl CommandDockerClient {
	pub fn new() -> Self {
		Self {
			command_timeout: DEFAULT_COMMAND_TIMEOUT,
		}
	}

	/// Override the bound for non-build invocations.
	pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
		self.command_timeout = timeout;
		self
	}

	async fn run_docker(&self, args: &[&str]) -> DockerResult<(String, String, bool)> {
		debug!(?args, "running docker");
		let output = Command::new("docker")
			.args(args)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.output();

		let output = match tokio::time::timeout(self.command_timeout, output).await {
			Ok(result) => result.map_err(|source| DockerError::Spawn { source })?,
			Err(_) => {
				return Err(DockerError::Timeout {
					timeout: self.command_timeout,
				})
			}
		};

		let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
		let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
		Ok((stdout, stderr, output.status.success()))
	}
}

impl Default for CommandDockerClient {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl ImageClient for CommandDockerClient {
	async fn is_available(&self) -> bool {
		match self
			.run_docker(&["version", "--format", "{{.Server.Version}}"])
			.await
		{
			Ok((_, _, success)) => success,
			Err(err) => {
				debug!(error = %err, "docker daemon probe failed");
				false
			}
		}
	}

	async fn build_image(
		&self,
		context: &str,
		dockerfile: &str,
		tag: &str,
	) -> DockerResult<BuildResult> {
		debug!(context, dockerfile, tag, "building image");

		let mut child = Command::new("docker")
			.args(["build", "-t", tag, "-f", dockerfile, context])
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()
			.map_err(|source| DockerError::Spawn { source })?;

		// BuildKit writes progress to stderr; classic builds to stdout.
		// Stream both while the build runs.
		let stdout = child.stdout.take();
		let stderr = child.stderr.take();
		let stdout_task = tokio::spawn(collect_lines(stdout));
		let stderr_task = tokio::spawn(collect_lines(stderr));

		let status = child
			.wait()
			.await
			.map_err(|source| DockerError::Spawn { source })?;

		let mut output = stdout_task.await.unwrap_or_default();
		output.extend(stderr_task.await.unwrap_or_default());

		if !status.success() {
			warn!(tag, exit_code = status.code().unwrap_or(-1), "image build failed");
			if let Some(line) = output.iter().find(|l| looks_like_daemon_failure(l)) {
				return Err(DockerError::DaemonUnavailable {
					message: line.clone(),
				});
			}
			return Ok(BuildResult {
				success: false,
				image_id: None,
				output,
			});
		}

		let image_id = self.get_image(tag).await?.map(|info| info.id);
		Ok(BuildResult {
			success: true,
			image_id,
			output,
		})
	}

	async fn get_image(&self, reference: &str) -> DockerResult<Option<ImageInfo>> {
		let (stdout, stderr, success) = self
			.run_docker(&["image", "inspect", reference, "--format", "{{json .}}"])
			.await?;

		if !success {
			if stderr.to_ascii_lowercase().contains("no such image") {
				return Ok(None);
			}
			return Err(classify_failure(&stderr));
		}

		parse_inspect_line(stdout.trim()).map(Some)
	}

	async fn list_images(&self, filters: &[String]) -> DockerResult<Vec<ImageInfo>> {
		let mut args = vec!["images", "--format", "{{json .}}"];
		for filter in filters {
			args.push("--filter");
			args.push(filter.as_str());
		}

		let (stdout, stderr, success) = self.run_docker(&args).await?;
		if !success {
			return Err(classify_failure(&stderr));
		}

		stdout
			.lines()
			.filter(|line| !line.trim().is_empty())
			.map(parse_images_line)
			.collect()
	}
}

async fn collect_lines(reader: Option<impl AsyncRead + Unpin>) -> Vec<String> {
	let Some(reader) = reader else {
		return Vec::new();
	};
	let mut lines = BufReader::new(reader).lines();
	let mut collected = Vec::new();
	while let Ok(Some(line)) = lines.next_line().await {
		debug!(line = %line, "build output");
		collected.push(line);
	}
	collected
}

fn looks_like_daemon_failure(line: &str) -> bool {
	let line = line.to_ascii_lowercase();
	line.contains("cannot connect to the docker daemon") || line.contains("error during connect")
}

fn classify_failure(stderr: &str) -> DockerError {
	let message = stderr.trim().to_string();
	if looks_like_daemon_failure(&message) {
		DockerError::DaemonUnavailable { message }
	} else {
		DockerError::CommandFailed { message }
	}
}

#[derive(Deserialize)]
struct InspectLine {
	#[serde(rename = "Id")]
	id: String,
	#[serde(rename = "RepoTags", default)]
	repo_tags: Vec<String>,
	#[serde(rename = "Created")]
	created: Option<String>,
	#[serde(rename = "Size")]
	size: Option<i64>,
}

fn parse_inspect_line(line: &str) -> DockerResult<ImageInfo> {
	let parsed: InspectLine = serde_json::from_str(line).map_err(|err| DockerError::Parse {
		message: format!("inspect output: {err}"),
	})?;
	Ok(ImageInfo {
		id: parsed.id,
		repo_tags: parsed.repo_tags,
		created: parsed.created,
		size: parsed.size,
	})
}

#[derive(Deserialize)]
struct ImagesLine {
	#[serde(rename = "ID")]
	id: String,
	#[serde(rename = "Repository")]
	repository: String,
	#[serde(rename = "Tag")]
	tag: String,
	#[serde(rename = "CreatedAt")]
	created_at: Option<String>,
}

fn parse_images_line(line: &str) -> DockerResult<ImageInfo> {
	let parsed: ImagesLine = serde_json::from_str(line).map_err(|err| DockerError::Parse {
		message: format!("images output: {err}"),
	})?;
	Ok(ImageInfo {
		id: parsed.id,
		repo_tags: vec![format!("{}:{}", parsed.repository, parsed.tag)],
		created: parsed.created_at,
		// `docker images` renders size as human text; left unset.
		size: None,
	})
}
