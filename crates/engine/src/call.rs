// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine calls as data.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use hal_core::{ImageRef, ResourceLimits, WorkerName};

/// Bind mount in a run request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindMount {
    pub source: PathBuf,
    pub target: PathBuf,
    #[serde(default)]
    pub read_only: bool,
    /// Mount propagation, e.g. `rprivate`. Engine default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagation: Option<String>,
}

impl BindMount {
    fn render(&self) -> String {
        let mut spec = format!(
            "type=bind,source={},target={}",
            self.source.display(),
            self.target.display()
        );
        if self.read_only {
            spec.push_str(",readonly");
        }
        if let Some(ref propagation) = self.propagation {
            spec.push_str(",bind-propagation=");
            spec.push_str(propagation);
        }
        spec
    }
}

/// Everything an engine `run` needs.
///
/// The name and image fields are the validated wrappers; a `RunSpec` cannot
/// be built around an unchecked string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    pub name: WorkerName,
    pub image: ImageRef,
    /// `container:<parent>` for workers; joins the parent's namespace.
    pub network_mode: String,
    pub limits: ResourceLimits,
    #[serde(default)]
    pub mounts: Vec<BindMount>,
    /// Non-root uid[:gid] inside the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default)]
    pub env: Vec<(String, String)>,
    /// Container command, argv form.
    #[serde(default)]
    pub command: Vec<String>,
}

/// One request to the container engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineCall {
    Run(RunSpec),
    Exec { container: WorkerName, command: Vec<String> },
    Inspect { container: WorkerName, format: Option<String> },
    Rename { container: WorkerName, new_name: WorkerName },
    Stop { container: WorkerName, grace_secs: u64 },
    Rm { container: WorkerName, force: bool },
    Pull { image: ImageRef },
    VolumeCreate { name: WorkerName },
    Stats { container: WorkerName },
}

impl EngineCall {
    /// Subcommand name, used for error reporting and logs.
    pub fn op(&self) -> &'static str {
        match self {
            EngineCall::Run(_) => "run",
            EngineCall::Exec { .. } => "exec",
            EngineCall::Inspect { .. } => "inspect",
            EngineCall::Rename { .. } => "rename",
            EngineCall::Stop { .. } => "stop",
            EngineCall::Rm { .. } => "rm",
            EngineCall::Pull { .. } => "pull",
            EngineCall::VolumeCreate { .. } => "volume",
            EngineCall::Stats { .. } => "stats",
        }
    }

    /// Render to engine argv. Array form only; no shell ever sees these.
    pub fn argv(&self) -> Vec<String> {
        match self {
            EngineCall::Run(spec) => {
                let mut argv = vec![
                    "run".to_string(),
                    "-d".to_string(),
                    "--name".to_string(),
                    spec.name.as_str().to_string(),
                    "--network".to_string(),
                    spec.network_mode.clone(),
                    "--memory".to_string(),
                    spec.limits.memory.clone(),
                    "--cpus".to_string(),
                    format!("{}", spec.limits.cpus),
                    "--pids-limit".to_string(),
                    format!("{}", spec.limits.pids),
                ];
                for mount in &spec.mounts {
                    argv.push("--mount".to_string());
                    argv.push(mount.render());
                }
                if let Some(ref user) = spec.user {
                    argv.push("--user".to_string());
                    argv.push(user.clone());
                }
                for (key, value) in &spec.env {
                    argv.push("-e".to_string());
                    argv.push(format!("{}={}", key, value));
                }
                argv.push(spec.image.as_str().to_string());
                argv.extend(spec.command.iter().cloned());
                argv
            }
            EngineCall::Exec { container, command } => {
                let mut argv = vec!["exec".to_string(), container.as_str().to_string()];
                argv.extend(command.iter().cloned());
                argv
            }
            EngineCall::Inspect { container, format } => {
                let mut argv = vec!["inspect".to_string()];
                if let Some(format) = format {
                    argv.push("--format".to_string());
                    argv.push(format.clone());
                }
                argv.push(container.as_str().to_string());
                argv
            }
            EngineCall::Rename { container, new_name } => vec![
                "rename".to_string(),
                container.as_str().to_string(),
                new_name.as_str().to_string(),
            ],
            EngineCall::Stop { container, grace_secs } => vec![
                "stop".to_string(),
                "-t".to_string(),
                format!("{}", grace_secs),
                container.as_str().to_string(),
            ],
            EngineCall::Rm { container, force } => {
                let mut argv = vec!["rm".to_string()];
                if *force {
                    argv.push("-f".to_string());
                }
                argv.push(container.as_str().to_string());
                argv
            }
            EngineCall::Pull { image } => {
                vec!["pull".to_string(), image.as_str().to_string()]
            }
            EngineCall::VolumeCreate { name } => vec![
                "volume".to_string(),
                "create".to_string(),
                name.as_str().to_string(),
            ],
            EngineCall::Stats { container } => vec![
                "stats".to_string(),
                "--no-stream".to_string(),
                "--format".to_string(),
                "{{json .}}".to_string(),
                container.as_str().to_string(),
            ],
        }
    }
}

#[cfg(test)]
#[path = "call_tests.rs"]
mod tests;
