// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attach/send/list/stop routed to workers through the multiplexer.
//!
//! The multiplexer sockets live on a shared volume, so the parent drives
//! panes directly with `tmux -S`. Commands targeting the same worker are
//! serialized through a per-session async mutex; cross-worker commands are
//! independent.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hal_core::{Clock, Error, Result, WorkerName, WorkerState};
use hal_engine::{container_exists, Engine, EngineCall};
use hal_storage::StateStore;
use tracing::{debug, info};

use crate::protocol::{AttachInfo, WorkerEntry};
use crate::spawner::MAIN_TMUX_SESSION;

pub struct Coordinator<E, C> {
    engine: Arc<E>,
    store: StateStore,
    clock: C,
    stop_grace: Duration,
    locks: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<E: Engine, C: Clock> Coordinator<E, C> {
    pub fn new(engine: Arc<E>, store: StateStore, clock: C, stop_grace: Duration) -> Self {
        Self { engine, store, clock, stop_grace, locks: parking_lot::Mutex::new(HashMap::new()) }
    }

    /// FIFO queue per session's worker.
    fn worker_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(
            self.locks
                .lock()
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Worker records with engine liveness attached.
    pub async fn list_workers(&self) -> Result<Vec<WorkerEntry>> {
        let mut entries = Vec::new();
        for worker in self.store.list_workers()? {
            let name = WorkerName::parse(&worker.name)?;
            let alive = container_exists(&*self.engine, &name).await.unwrap_or(false);
            entries.push(WorkerEntry {
                name: worker.name,
                state: worker.state,
                image: worker.image_ref.as_str().to_string(),
                session_id: worker.session_id,
                alive,
                created_at_ms: worker.created_at_ms,
            });
        }
        Ok(entries)
    }

    /// Resolve a session to its worker and hand back what the caller needs
    /// to stream the pane to its TTY. The worker goes `busy` and the attach
    /// stamp is refreshed.
    pub async fn attach(&self, session_id: &str) -> Result<AttachInfo> {
        let lock = self.worker_lock(session_id);
        let _serial = lock.lock().await;

        let mut worker = self.store.get_worker_for_session(session_id)?;
        let name = WorkerName::parse(&worker.name)?;
        if !container_exists(&*self.engine, &name).await? {
            return Err(Error::NotFound(format!(
                "worker container for session {} is gone",
                session_id
            )));
        }

        let now_ms = self.clock.epoch_ms();
        worker.state = WorkerState::Busy;
        worker.last_attached_at_ms = now_ms;
        self.store.put_worker(&worker)?;
        if let Ok(mut session) = self.store.get_session(session_id) {
            session.last_attached_at_ms = now_ms;
            self.store.put_session(&session)?;
        }

        debug!(session = session_id, worker = %worker.name, "attach");
        Ok(AttachInfo {
            tmux_socket: worker.tmux_socket_path,
            tmux_session: MAIN_TMUX_SESSION.to_string(),
        })
    }

    /// The attached client disconnected: `busy → idle`.
    pub async fn detached(&self, session_id: &str) -> Result<()> {
        let lock = self.worker_lock(session_id);
        let _serial = lock.lock().await;

        let mut worker = self.store.get_worker_for_session(session_id)?;
        worker.state = WorkerState::Idle;
        worker.last_attached_at_ms = self.clock.epoch_ms();
        self.store.put_worker(&worker)?;
        debug!(session = session_id, worker = %worker.name, "detached");
        Ok(())
    }

    /// Forward input to the worker's pane. Non-interactive; requires the
    /// pane to exist.
    pub async fn send(&self, session_id: &str, keys: &str) -> Result<()> {
        let lock = self.worker_lock(session_id);
        let _serial = lock.lock().await;

        let worker = self.store.get_worker_for_session(session_id)?;
        let socket = worker.tmux_socket_path.clone();
        if tmux(&socket, &["has-session", "-t", MAIN_TMUX_SESSION]).await.is_err() {
            return Err(Error::NotFound(format!(
                "no multiplexer pane for session {}",
                session_id
            )));
        }
        tmux(&socket, &["send-keys", "-t", MAIN_TMUX_SESSION, keys, "Enter"]).await?;
        Ok(())
    }

    /// Graceful stop, then remove after the grace period.
    pub async fn stop(&self, session_id: &str) -> Result<()> {
        let lock = self.worker_lock(session_id);
        let _serial = lock.lock().await;

        let worker = self.store.get_worker_for_session(session_id)?;
        let name = WorkerName::parse(&worker.name)?;
        if let Err(e) = self
            .engine
            .call(EngineCall::Stop {
                container: name.clone(),
                grace_secs: self.stop_grace.as_secs(),
            })
            .await
        {
            debug!(worker = %worker.name, error = %e, "stop before rm failed");
        }
        self.engine.call(EngineCall::Rm { container: name, force: true }).await?;
        self.store.delete_worker(&worker)?;
        let _ = std::fs::remove_file(&worker.tmux_socket_path);
        crate::workspace::remove(&self.store.workspaces_dir(), &worker.workspace_path)?;

        if let Ok(mut session) = self.store.get_session(session_id) {
            session.container_id = None;
            self.store.put_session(&session)?;
        }
        info!(session = session_id, worker = %worker.name, "worker stopped");
        Ok(())
    }
}

/// Run one tmux command against a socket on the shared volume.
async fn tmux(socket: &Path, args: &[&str]) -> Result<String> {
    let output = tokio::process::Command::new("tmux")
        .arg("-S")
        .arg(socket)
        .args(args)
        .output()
        .await
        .map_err(|e| Error::Internal(format!("failed to run tmux: {}", e)))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(Error::Internal(format!(
            "tmux {} failed: {}",
            args.first().unwrap_or(&""),
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
