// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker creation.
//!
//! A worker joins the parent's network namespace, gets the session's
//! resource limits, mounts a workspace at `/workspace` (the project itself
//! for cold spawns, a pool-owned directory for warm workers) plus the
//! shared multiplexer directory, runs as a non-root uid, and never sees
//! the engine socket. The image entrypoint starts the detached multiplexer
//! session whose pane runs the assistant CLI, reading the socket and
//! session names from the environment we pass.

use std::path::PathBuf;
use std::sync::Arc;

use hal_core::{
    Clock, ImageAllowlist, ImageRef, Profile, ResourceLimits, Result, Session, WorkerName,
    WorkerRecord, WorkerState,
};
use hal_engine::{BindMount, Engine, EngineCall, RunSpec};
use hal_storage::StateStore;
use tracing::{info, warn};

/// Non-root uid:gid every worker runs as.
const WORKER_USER: &str = "1000:1000";

/// Name of the multiplexer session the image entrypoint creates.
pub const MAIN_TMUX_SESSION: &str = "main";

/// Project mount point inside the worker.
const WORKSPACE_TARGET: &str = "/workspace";

/// Where the shared multiplexer directory appears inside the worker.
const TMUX_MOUNT_TARGET: &str = "/shared/tmux";

/// API-key secret the front-end may place under `secrets/`. Never read
/// from the environment; absent means the assistant CLI authenticates
/// interactively.
const API_KEY_SECRET: &str = "api-key";

/// Where the secret appears inside the worker.
const API_KEY_TARGET: &str = "/shared/secrets/api-key";

pub struct WorkerSpawner<E, C> {
    engine: Arc<E>,
    store: StateStore,
    allowlist: ImageAllowlist,
    parent_container: String,
    tmux_dir: PathBuf,
    worker_image: String,
    limits: ResourceLimits,
    clock: C,
}

impl<E: Engine, C: Clock> WorkerSpawner<E, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: Arc<E>,
        store: StateStore,
        allowlist: ImageAllowlist,
        parent_container: String,
        tmux_dir: PathBuf,
        worker_image: String,
        limits: ResourceLimits,
        clock: C,
    ) -> Self {
        Self { engine, store, allowlist, parent_container, tmux_dir, worker_image, limits, clock }
    }

    /// Cold spawn for a session: the project itself is bind-mounted
    /// read-write at `/workspace` with private propagation.
    pub async fn spawn_session_worker(&self, session: &Session) -> Result<(WorkerRecord, String)> {
        let name = WorkerName::parse(&session.id)?;
        let image = self.allowlist.resolve(&self.image_for(session.profile))?;
        self.spawn_inner(name, image, session.project_path.clone(), Some(session)).await
    }

    /// Warm spawn for the pool. No project exists yet and a claim cannot
    /// add mounts, so the worker gets its own directory under
    /// `workspaces/`; the claim delivers the project into it.
    pub async fn spawn_warm_worker(&self) -> Result<WorkerRecord> {
        let name = WorkerName::parse(&format!("hal-9000-warm-{}", nanoid::nanoid!(8)))?;
        let image = self.allowlist.resolve(&self.worker_image)?;
        let workspace = self.store.workspaces_dir().join(name.as_str());
        crate::workspace::create(&workspace)?;
        let (record, _container_id) = self.spawn_inner(name, image, workspace, None).await?;
        Ok(record)
    }

    fn image_for(&self, profile: Profile) -> String {
        match profile {
            Profile::Base => self.worker_image.clone(),
            other => self.allowlist.reference_for(other),
        }
    }

    fn tmux_mount(&self) -> BindMount {
        BindMount {
            source: self.tmux_dir.clone(),
            target: PathBuf::from(TMUX_MOUNT_TARGET),
            read_only: false,
            propagation: None,
        }
    }

    /// Mount for the API-key secret, when the front-end provided one.
    /// A present-but-loose file refuses the spawn; a missing file defers
    /// authentication to the assistant CLI.
    fn secret_mount(&self) -> Result<Option<BindMount>> {
        match self.store.read_secret(API_KEY_SECRET) {
            Ok(_) => Ok(Some(BindMount {
                source: self.store.secrets_dir().join(API_KEY_SECRET),
                target: PathBuf::from(API_KEY_TARGET),
                read_only: true,
                propagation: None,
            })),
            Err(e) if e.kind() == hal_core::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn spawn_inner(
        &self,
        name: WorkerName,
        image: ImageRef,
        workspace_path: PathBuf,
        session: Option<&Session>,
    ) -> Result<(WorkerRecord, String)> {
        let mut mounts = vec![
            BindMount {
                source: workspace_path.clone(),
                target: PathBuf::from(WORKSPACE_TARGET),
                read_only: false,
                propagation: Some("rprivate".to_string()),
            },
            self.tmux_mount(),
        ];
        if let Some(secret) = self.secret_mount()? {
            mounts.push(secret);
        }
        let network_mode = format!("container:{}", self.parent_container);
        let socket_name = format!("{}.sock", name.as_str());
        let limits =
            session.map(|s| s.resource_limits.clone()).unwrap_or_else(|| self.limits.clone());

        let spec = RunSpec {
            name: name.clone(),
            image: image.clone(),
            network_mode: network_mode.clone(),
            limits: limits.clone(),
            mounts,
            user: Some(WORKER_USER.to_string()),
            env: vec![
                (
                    "HAL9000_TMUX_SOCKET".to_string(),
                    format!("{}/{}", TMUX_MOUNT_TARGET, socket_name),
                ),
                ("HAL9000_TMUX_SESSION".to_string(), MAIN_TMUX_SESSION.to_string()),
            ],
            command: vec![],
        };

        let now_ms = self.clock.epoch_ms();
        let output = match self.engine.call(EngineCall::Run(spec)).await {
            Ok(output) => output,
            Err(e) => {
                // The run may have created the container before failing
                // (e.g. a mount error). Remove the dangling name and surface
                // the original error. No retry.
                warn!(worker = %name, error = %e, "run failed; removing dangling container");
                let _ = self
                    .engine
                    .call(EngineCall::Rm { container: name.clone(), force: true })
                    .await;
                return Err(e);
            }
        };

        let record = WorkerRecord {
            name: name.as_str().to_string(),
            state: if session.is_some() { WorkerState::Busy } else { WorkerState::Warm },
            image_ref: image,
            network_mode,
            tmux_socket_path: self.tmux_dir.join(socket_name),
            workspace_path,
            session_id: session.map(|s| s.id.clone()),
            created_at_ms: now_ms,
            last_attached_at_ms: if session.is_some() { now_ms } else { 0 },
            resource_limits: limits,
            extra: serde_json::Map::new(),
        };
        if let Err(e) = self.store.put_worker(&record) {
            // Recording failed after creation: still remove the container.
            let _ =
                self.engine.call(EngineCall::Rm { container: name.clone(), force: true }).await;
            return Err(e);
        }

        info!(
            worker = %record.name,
            state = record.state.as_str(),
            pooled = session.is_none(),
            "worker spawned"
        );
        Ok((record, output.stdout))
    }
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
