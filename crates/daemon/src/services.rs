// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared services hosted inside the parent.
//!
//! Today that is one service: the vector-index server. It binds on the
//! parent's interfaces, so every worker sharing the parent's network
//! namespace reaches it at `localhost:<port>`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hal_core::{Error, Health, Result};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::http;

/// Misses tolerated before `ok` degrades to `failed`.
const MAX_HEARTBEAT_MISSES: u32 = 3;

/// Cadence of the background heartbeat.
const HEARTBEAT_EVERY: Duration = Duration::from_secs(10);

/// Poll cadence while blocking on initial readiness.
const READY_POLL_EVERY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct VectorIndexConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
}

impl VectorIndexConfig {
    /// Address the parent probes. A wildcard bind is probed via loopback.
    pub fn probe_addr(&self) -> String {
        let host = if self.host == "0.0.0.0" { "127.0.0.1" } else { self.host.as_str() };
        format!("{}:{}", host, self.port)
    }
}

struct ProbeState {
    health: Health,
    misses: u32,
}

/// The vector-index server process plus its health state machine.
pub struct VectorIndex {
    config: VectorIndexConfig,
    probe: Mutex<ProbeState>,
    child: Mutex<Option<tokio::process::Child>>,
}

impl VectorIndex {
    pub fn new(config: VectorIndexConfig) -> Self {
        Self {
            config,
            probe: Mutex::new(ProbeState { health: Health::Starting, misses: 0 }),
            child: Mutex::new(None),
        }
    }

    pub fn health(&self) -> Health {
        self.probe.lock().health
    }

    pub fn config(&self) -> &VectorIndexConfig {
        &self.config
    }

    /// Launch the server process with its data directory on the persistent
    /// volume. Readiness is observed separately via the heartbeat.
    pub async fn start(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.data_dir)?;
        let child = tokio::process::Command::new("chroma")
            .arg("run")
            .arg("--host")
            .arg(&self.config.host)
            .arg("--port")
            .arg(self.config.port.to_string())
            .arg("--path")
            .arg(&self.config.data_dir)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| Error::Internal(format!("failed to launch vector-index server: {}", e)))?;
        info!(
            host = %self.config.host,
            port = self.config.port,
            data_dir = %self.config.data_dir.display(),
            "vector-index server launched"
        );
        *self.child.lock() = Some(child);
        Ok(())
    }

    /// One heartbeat probe: GET `/api/v2/heartbeat`.
    pub async fn heartbeat(&self) -> bool {
        http::get_ok(&self.config.probe_addr(), "/api/v2/heartbeat").await
    }

    /// Fold a probe result into the health state machine:
    /// `starting → ok` on the first success, `ok → failed` after
    /// [`MAX_HEARTBEAT_MISSES`] consecutive misses.
    pub fn observe(&self, probe_ok: bool) -> Health {
        let mut state = self.probe.lock();
        if probe_ok {
            state.misses = 0;
            state.health = Health::Ok;
        } else {
            state.misses += 1;
            if state.health == Health::Ok && state.misses >= MAX_HEARTBEAT_MISSES {
                state.health = Health::Failed;
            }
        }
        state.health
    }

    /// Block until the heartbeat reports OK, with a hard deadline.
    pub async fn wait_ready(&self, deadline: Duration) -> Result<()> {
        let gate = async {
            loop {
                if self.heartbeat().await {
                    self.observe(true);
                    return;
                }
                tokio::time::sleep(READY_POLL_EVERY).await;
            }
        };
        tokio::time::timeout(deadline, gate).await.map_err(|_| {
            Error::Timeout(format!(
                "vector-index not ready on {} within {:?}",
                self.config.probe_addr(),
                deadline
            ))
        })
    }

    /// Low-rate background probe until cancelled.
    pub fn spawn_heartbeat_loop(self: &Arc<Self>, cancel: CancellationToken) {
        let index = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(HEARTBEAT_EVERY) => {}
                }
                let probe_ok = index.heartbeat().await;
                let health = index.observe(probe_ok);
                if health == Health::Failed {
                    warn!("vector-index heartbeat failing");
                }
            }
        });
    }

    /// Terminate the server process, if we started one.
    pub async fn stop(&self) {
        let child = self.child.lock().take();
        if let Some(mut child) = child {
            let _ = child.kill().await;
        }
    }
}

#[cfg(test)]
#[path = "services_tests.rs"]
mod tests;
