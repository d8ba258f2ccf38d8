// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! First-boot sequencing for the parent.
//!
//! Preflight (dirs, single-instance lock, engine probe, allowlist check),
//! parallel warm-up (multiplexer server, vector index, image pull),
//! readiness gate on the vector-index heartbeat, then background services.
//! Rerunning against an already-started parent fails the lock cleanly.

use std::io::Write;
use std::os::unix::fs::DirBuilderExt;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use hal_core::{Clock, Error, Result, SystemClock};
use hal_engine::{Engine, EngineCall};
use hal_storage::StateStore;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::listener::ListenCtx;
use crate::services::VectorIndex;
use crate::sessions::SessionApi;
use crate::spawner::WorkerSpawner;

pub struct StartupResult<E, C> {
    pub ctx: Arc<ListenCtx<E, C>>,
    pub listener: UnixListener,
    /// Held for the daemon's lifetime; releasing it frees the instance slot.
    pub lock_file: std::fs::File,
    /// Cancels the heartbeat loop (and anything else bootstrap spawned).
    pub cancel: CancellationToken,
}

impl<E, C> std::fmt::Debug for StartupResult<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupResult").finish_non_exhaustive()
    }
}

/// Start the parent with the system clock.
pub async fn startup<E: Engine>(
    config: Config,
    engine: Arc<E>,
) -> Result<StartupResult<E, SystemClock>> {
    startup_with_clock(config, engine, SystemClock).await
}

/// Start the parent. Test entry point: inject a fake engine and clock.
pub async fn startup_with_clock<E: Engine, C: Clock>(
    config: Config,
    engine: Arc<E>,
    clock: C,
) -> Result<StartupResult<E, C>> {
    match startup_inner(config.clone(), engine, clock).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Leave the lock file alone when another daemon holds it.
            if e.kind() != hal_core::ErrorKind::Conflict {
                cleanup_on_failure(&config);
            }
            Err(e)
        }
    }
}

async fn startup_inner<E: Engine, C: Clock>(
    config: Config,
    engine: Arc<E>,
    clock: C,
) -> Result<StartupResult<E, C>> {
    // --- Phase 1: preflight ---

    let store = StateStore::open(&config.state_dir)?;
    if !config.tmux_dir.exists() {
        std::fs::DirBuilder::new().recursive(true).mode(0o700).create(&config.tmux_dir)?;
    }

    let lock_file = acquire_daemon_lock(&config)?;

    engine.probe().await?;

    // The configured worker image must be admitted before anything runs.
    let worker_image = config.allowlist.resolve(&config.worker_image)?;

    // --- Phase 2: parallel warm-up ---

    let vector_index = Arc::new(VectorIndex::new(config.vector_index.clone()));
    let mux_socket = config.tmux_dir.join("parent.sock");
    let (mux_result, index_result) =
        tokio::join!(start_mux_server(&mux_socket), vector_index.start());
    // A multiplexer that won't start or an index that won't even launch is
    // fatal; index *readiness* is checked at the gate below.
    mux_result?;
    index_result?;

    if config.skip_image_pull {
        info!("worker image pull skipped");
    } else {
        let pull = EngineCall::Pull { image: worker_image };
        if config.lazy_image_pull {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                if let Err(e) = engine.call(pull).await {
                    warn!(error = %e, "background worker image pull failed");
                }
            });
        } else if let Err(e) = engine.call(pull).await {
            warn!(error = %e, "worker image pull failed");
        }
    }

    // --- Phase 3: readiness gate ---

    if let Err(e) = vector_index.wait_ready(config.readiness_deadline).await {
        vector_index.stop().await;
        return Err(e);
    }
    info!("vector-index ready");

    // --- Bind the daemon socket ---

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| Error::Internal(format!("bind {}: {}", config.socket_path.display(), e)))?;

    // --- Assemble the context ---

    let spawner = Arc::new(WorkerSpawner::new(
        Arc::clone(&engine),
        store.clone(),
        config.allowlist.clone(),
        config.parent_container.clone(),
        config.tmux_dir.clone(),
        config.worker_image.clone(),
        config.limits.clone(),
        clock.clone(),
    ));
    let coordinator = Arc::new(Coordinator::new(
        Arc::clone(&engine),
        store.clone(),
        clock.clone(),
        config.stop_grace,
    ));
    let api = SessionApi::new(
        Arc::clone(&engine),
        store.clone(),
        Arc::clone(&spawner),
        Arc::clone(&coordinator),
        config.limits.clone(),
        clock.clone(),
    );

    let ctx = Arc::new(ListenCtx {
        engine,
        store,
        api,
        coordinator,
        spawner,
        vector_index: Arc::clone(&vector_index),
        pool_config: parking_lot::Mutex::new(config.pool.clone()),
        pool: tokio::sync::Mutex::new(None),
        clock,
        start_time: Instant::now(),
        shutdown: Arc::new(Notify::new()),
        stop_grace: config.stop_grace,
    });

    // --- Phase 4: background services ---

    let cancel = CancellationToken::new();
    vector_index.spawn_heartbeat_loop(cancel.clone());
    if config.pool_manager_enabled {
        ctx.start_pool().await;
        info!("pool manager enabled at startup");
    }

    info!(socket = %config.socket_path.display(), "daemon started");
    Ok(StartupResult { ctx, listener, lock_file, cancel })
}

/// Take the single-instance lock and record our pid in it.
fn acquire_daemon_lock(config: &Config) -> Result<std::fs::File> {
    // Avoid truncating before the lock is held; the pid inside belongs to
    // the running daemon until then.
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|_| Error::Conflict("daemon already running".to_string()))?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

/// Start the multiplexer server on the shared-volume socket.
async fn start_mux_server(socket: &std::path::Path) -> Result<()> {
    let output = tokio::process::Command::new("tmux")
        .arg("-S")
        .arg(socket)
        .arg("start-server")
        .output()
        .await
        .map_err(|e| Error::Internal(format!("failed to start multiplexer server: {}", e)))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(Error::Internal(format!(
            "multiplexer server failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

/// Clean up resources on startup failure.
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
