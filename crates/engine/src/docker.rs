// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker CLI backend.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use hal_core::{Error, Result};
use tracing::debug;

use crate::{Engine, EngineCall, EngineOutput};

/// Engine backed by the `docker` CLI talking to a mounted socket.
///
/// Each call runs as a subprocess with a hard timeout; a missing socket is
/// reported as `EngineUnavailable` before anything is executed.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    socket: PathBuf,
    call_timeout: Duration,
}

impl DockerEngine {
    pub fn new(socket: PathBuf, call_timeout: Duration) -> Self {
        Self { socket, call_timeout }
    }

    fn check_socket(&self) -> Result<()> {
        if self.socket.exists() {
            Ok(())
        } else {
            Err(Error::EngineUnavailable(format!(
                "engine socket {} is not mounted",
                self.socket.display()
            )))
        }
    }

    async fn run_docker(&self, op: &'static str, argv: &[String]) -> Result<EngineOutput> {
        self.check_socket()?;

        let mut cmd = tokio::process::Command::new("docker");
        cmd.args(argv);
        cmd.env("DOCKER_HOST", format!("unix://{}", self.socket.display()));
        cmd.kill_on_drop(true);

        debug!(op, argc = argv.len(), "engine call");
        let output = tokio::time::timeout(self.call_timeout, cmd.output())
            .await
            .map_err(|_| {
                Error::Timeout(format!("engine {} exceeded {:?}", op, self.call_timeout))
            })?
            .map_err(|e| Error::EngineUnavailable(format!("failed to exec docker: {}", e)))?;

        if output.status.success() {
            Ok(EngineOutput { stdout: String::from_utf8_lossy(&output.stdout).trim().to_string() })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(Error::engine(op, stderr.trim().to_string()))
        }
    }
}

#[async_trait]
impl Engine for DockerEngine {
    async fn call(&self, call: EngineCall) -> Result<EngineOutput> {
        self.run_docker(call.op(), &call.argv()).await
    }

    async fn probe(&self) -> Result<()> {
        let argv =
            vec!["version".to_string(), "--format".to_string(), "{{.Server.Version}}".to_string()];
        self.run_docker("version", &argv).await.map(|_| ()).map_err(|e| match e {
            // A responding CLI with a dead daemon is still "unavailable".
            Error::EngineError { message, .. } => Error::EngineUnavailable(message),
            other => other,
        })
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
