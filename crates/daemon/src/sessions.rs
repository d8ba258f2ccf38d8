// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session API: the operations the CLI invokes.
//!
//! `spawn` is the interesting one. For a given session id it is serialized
//! through the session file lock, so concurrent callers see exactly one
//! creation and the rest attach. A warm pool hit is an engine `rename` of
//! the claimed container, never a second `run`.

use std::path::Path;
use std::sync::Arc;

use hal_core::{
    derive_session_name, Clock, Error, ErrorKind, Profile, ProjectPath, ResourceLimits, Result,
    Session, WorkerName, WorkerState,
};
use hal_engine::{container_exists, Engine, EngineCall};
use hal_storage::StateStore;
use tracing::{info, warn};

use crate::coordinator::Coordinator;
use crate::protocol::{AttachInfo, SessionEntry, SpawnedInfo};
use crate::spawner::{WorkerSpawner, MAIN_TMUX_SESSION};
use crate::workspace;

pub struct SessionApi<E, C> {
    engine: Arc<E>,
    store: StateStore,
    spawner: Arc<WorkerSpawner<E, C>>,
    coordinator: Arc<Coordinator<E, C>>,
    limits: ResourceLimits,
    clock: C,
}

impl<E: Engine, C: Clock> SessionApi<E, C> {
    pub fn new(
        engine: Arc<E>,
        store: StateStore,
        spawner: Arc<WorkerSpawner<E, C>>,
        coordinator: Arc<Coordinator<E, C>>,
        limits: ResourceLimits,
        clock: C,
    ) -> Self {
        Self { engine, store, spawner, coordinator, limits, clock }
    }

    /// Create or reattach the session for a project directory.
    pub async fn spawn(
        &self,
        path: &Path,
        profile: Option<&str>,
        name_override: Option<&str>,
    ) -> Result<SpawnedInfo> {
        // Validation first; nothing below runs on unchecked input.
        let project = ProjectPath::canonicalize(path)?;
        let profile = match profile {
            Some(p) => Profile::parse(p)?,
            None => Profile::default(),
        };
        let id = match name_override {
            Some(name) => WorkerName::parse(name)?.as_str().to_string(),
            None => derive_session_name(&project),
        };

        // Claim lock: spawn for one session id is serialized across
        // processes. Held around the lookup/claim/record section only.
        let _claim = self.store.lock_session(&id)?;
        let now_ms = self.clock.epoch_ms();

        // An existing live worker means the race is already won; attach.
        if let Ok(worker) = self.store.get_worker_for_session(&id) {
            let name = WorkerName::parse(&worker.name)?;
            if container_exists(&*self.engine, &name).await? {
                let session = self.store.get_session(&id)?;
                let attach = self.coordinator.attach(&id).await?;
                return Ok(SpawnedInfo {
                    session: SessionEntry::from(&session),
                    attach,
                    from_pool: false,
                    created: false,
                });
            }
            // Stale record; the container died behind our back.
            self.store.delete_worker(&worker)?;
            workspace::remove(&self.store.workspaces_dir(), &worker.workspace_path)?;
        }

        let mut session = match self.store.get_session(&id) {
            Ok(existing) => existing,
            Err(e) if e.kind() == ErrorKind::NotFound => Session::new(
                id.clone(),
                project.as_path().to_path_buf(),
                profile,
                self.limits.clone(),
                now_ms,
            ),
            Err(e) => return Err(e),
        };

        // Warm pool first, cold spawn as fallback.
        let (worker, container_id, from_pool) = match self.claim_from_pool(&session).await? {
            Some((record, container_id)) => (record, container_id, true),
            None => {
                let (record, container_id) = self.spawner.spawn_session_worker(&session).await?;
                (record, container_id, false)
            }
        };

        session.container_id = Some(container_id);
        session.last_attached_at_ms = now_ms;
        self.store.put_session(&session)?;

        info!(session = %session.id, worker = %worker.name, from_pool, "session spawned");
        Ok(SpawnedInfo {
            session: SessionEntry::from(&session),
            attach: AttachInfo {
                tmux_socket: worker.tmux_socket_path,
                tmux_session: MAIN_TMUX_SESSION.to_string(),
            },
            from_pool,
            created: true,
        })
    }

    /// Try to promote a warm worker: atomic record rename, container
    /// rename, then project delivery into the worker's workspace (the
    /// rename cannot add mounts). Returns `None` when the pool cannot
    /// serve the request.
    async fn claim_from_pool(
        &self,
        session: &Session,
    ) -> Result<Option<(hal_core::WorkerRecord, String)>> {
        let now_ms = self.clock.epoch_ms();
        loop {
            let Some(mut worker) = self.store.claim_warm(&session.id, now_ms)? else {
                return Ok(None);
            };
            let old_name = WorkerName::parse(&worker.name)?;
            let new_name = WorkerName::parse(&session.id)?;
            match self
                .engine
                .call(EngineCall::Rename { container: old_name, new_name: new_name.clone() })
                .await
            {
                Ok(_) => {
                    if let Err(e) =
                        workspace::deliver_project(&session.project_path, &worker.workspace_path)
                            .await
                    {
                        // The worker is bound to the session name but has no
                        // project; it cannot serve anyone. Retire it and try
                        // the next candidate.
                        warn!(worker = %worker.name, error = %e, "project delivery failed");
                        self.discard_claimed(&worker, &new_name).await;
                        continue;
                    }
                    worker.name = session.id.clone();
                    worker.state = WorkerState::Busy;
                    self.store.put_worker(&worker)?;
                    let container_id = self
                        .engine
                        .call(EngineCall::Inspect {
                            container: new_name,
                            format: Some("{{.Id}}".to_string()),
                        })
                        .await
                        .map(|o| o.stdout)
                        .unwrap_or_default();
                    return Ok(Some((worker, container_id)));
                }
                Err(Error::EngineError { message, .. }) => {
                    // The warm container died between record and rename.
                    // Discard it and try the next candidate.
                    warn!(worker = %worker.name, %message, "claimed worker unusable");
                    self.discard_claimed(&worker, &new_name).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Remove a half-claimed worker: container, record, and its pool-owned
    /// workspace.
    async fn discard_claimed(&self, worker: &hal_core::WorkerRecord, name: &WorkerName) {
        let _ = self
            .engine
            .call(EngineCall::Rm { container: name.clone(), force: true })
            .await;
        if let Err(e) = self.store.delete_worker(worker) {
            warn!(worker = %worker.name, error = %e, "could not drop claimed record");
        }
        let _ = workspace::remove(&self.store.workspaces_dir(), &worker.workspace_path);
    }

    /// Resolve an attach for an existing session.
    pub async fn attach(&self, session_id: &str) -> Result<AttachInfo> {
        // Surface "no such session" before "no such worker".
        let _session = self.store.get_session(session_id)?;
        self.coordinator.attach(session_id).await
    }

    pub async fn detached(&self, session_id: &str) -> Result<()> {
        self.coordinator.detached(session_id).await
    }

    pub async fn send(&self, session_id: &str, keys: &str) -> Result<()> {
        self.coordinator.send(session_id, keys).await
    }

    /// Stop a session's worker. The session record survives, so a later
    /// spawn of the same path reuses the same id.
    pub async fn stop(&self, session_id: &str) -> Result<()> {
        let _session = self.store.get_session(session_id)?;
        self.coordinator.stop(session_id).await
    }

    pub fn list_sessions(&self) -> Result<Vec<SessionEntry>> {
        Ok(self.store.list_sessions()?.iter().map(SessionEntry::from).collect())
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
