// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Warm-worker pool upkeep.
//!
//! One strictly-serialized reconciliation loop. Each tick drops records for
//! vanished containers, ages attached workers toward `idle`, scales the warm
//! set toward `[min, max]`, and reaps idle workers past their timeout.
//! Per-tick failures are logged and the loop continues; only cancellation
//! stops it.

use std::sync::Arc;
use std::time::Duration;

use hal_core::{Clock, ErrorKind, Result, WorkerName, WorkerState};
use hal_engine::{container_exists, Engine, EngineCall};
use hal_storage::StateStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::spawner::WorkerSpawner;

/// Pool sizing and cadence.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub min_warm: usize,
    pub max_warm: usize,
    pub idle_timeout: Duration,
    pub check_interval: Duration,
    pub stop_grace: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_warm: 2,
            max_warm: 5,
            idle_timeout: Duration::from_secs(300),
            check_interval: Duration::from_secs(30),
            stop_grace: Duration::from_secs(10),
        }
    }
}

/// What one tick did, for logs and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Records dropped because their container no longer exists.
    pub dropped: usize,
    /// Busy workers aged to idle (stale attach).
    pub idled: usize,
    /// Warm workers spawned to reach the floor.
    pub spawned: usize,
    /// Warm workers retired to respect the ceiling.
    pub retired: usize,
    /// Idle workers reaped past their timeout.
    pub reaped: usize,
}

pub struct PoolManager<E, C> {
    engine: Arc<E>,
    store: StateStore,
    spawner: Arc<WorkerSpawner<E, C>>,
    config: PoolConfig,
    clock: C,
}

impl<E: Engine, C: Clock> PoolManager<E, C> {
    pub fn new(
        engine: Arc<E>,
        store: StateStore,
        spawner: Arc<WorkerSpawner<E, C>>,
        config: PoolConfig,
        clock: C,
    ) -> Self {
        Self { engine, store, spawner, config, clock }
    }

    /// Run ticks until cancelled. Engine outages back the cadence off by one
    /// extra interval rather than spinning.
    pub async fn run(self, cancel: CancellationToken) {
        if let Err(e) = self.store.write_pool_pid(std::process::id()) {
            warn!(error = %e, "could not write pool-manager pid");
        }
        info!(
            min = self.config.min_warm,
            max = self.config.max_warm,
            interval_secs = self.config.check_interval.as_secs(),
            "pool manager started"
        );

        loop {
            let started = std::time::Instant::now();
            let mut backoff = false;
            match self.tick().await {
                Ok(report) => debug!(?report, "pool tick"),
                Err(e) if e.kind() == ErrorKind::EngineUnavailable => {
                    warn!(error = %e, "engine unavailable; backing off");
                    backoff = true;
                }
                Err(e) => warn!(error = %e, "pool tick failed"),
            }
            let elapsed = started.elapsed();
            if elapsed > 2 * self.config.check_interval {
                warn!(elapsed_ms = elapsed.as_millis() as u64, "slow pool tick");
            }

            let sleep_for = if backoff {
                2 * self.config.check_interval
            } else {
                self.config.check_interval
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }

        self.store.clear_pool_pid();
        info!("pool manager stopped");
    }

    /// One reconcile/scale/reap pass. Public so tests drive ticks manually.
    pub async fn tick(&self) -> Result<TickReport> {
        let mut report = TickReport::default();
        let now_ms = self.clock.epoch_ms();
        let idle_ms = self.config.idle_timeout.as_millis() as u64;

        // 1. Reconcile records against the engine.
        for mut worker in self.store.list_workers()? {
            let name = WorkerName::parse(&worker.name)?;
            if !container_exists(&*self.engine, &name).await? {
                self.store.delete_worker(&worker)?;
                crate::workspace::remove(&self.store.workspaces_dir(), &worker.workspace_path)?;
                report.dropped += 1;
                continue;
            }
            if worker.state == WorkerState::Busy
                && now_ms.saturating_sub(worker.last_attached_at_ms) > idle_ms
            {
                // The attached client is long gone; begin the idle clock.
                worker.state = WorkerState::Idle;
                worker.last_attached_at_ms = now_ms;
                self.store.put_worker(&worker)?;
                report.idled += 1;
            }
        }

        // 2. Scale up to the floor.
        let mut warm_count = self.store.list_warm()?.len();
        while warm_count < self.config.min_warm {
            self.spawner.spawn_warm_worker().await?;
            warm_count += 1;
            report.spawned += 1;
        }

        // 3. Scale down from the ceiling, oldest first.
        let mut warm = self.store.list_warm()?;
        while warm.len() > self.config.max_warm {
            let oldest = warm.remove(0);
            self.retire(&oldest).await?;
            report.retired += 1;
        }

        // 4. Reap idle workers past their timeout.
        for worker in self.store.list_workers()? {
            if worker.state == WorkerState::Idle
                && now_ms.saturating_sub(worker.last_attached_at_ms) > idle_ms
            {
                self.retire(&worker).await?;
                if let Some(ref session_id) = worker.session_id {
                    self.release_session(session_id);
                }
                report.reaped += 1;
            }
        }

        Ok(report)
    }

    /// Stop, remove, and forget one worker.
    async fn retire(&self, worker: &hal_core::WorkerRecord) -> Result<()> {
        let name = WorkerName::parse(&worker.name)?;
        if let Err(e) = self
            .engine
            .call(EngineCall::Stop {
                container: name.clone(),
                grace_secs: self.config.stop_grace.as_secs(),
            })
            .await
        {
            // Already stopped is fine; rm -f below settles it.
            debug!(worker = %worker.name, error = %e, "stop before rm failed");
        }
        self.engine.call(EngineCall::Rm { container: name, force: true }).await?;
        self.store.delete_worker(worker)?;
        let _ = std::fs::remove_file(&worker.tmux_socket_path);
        crate::workspace::remove(&self.store.workspaces_dir(), &worker.workspace_path)?;
        info!(worker = %worker.name, state = worker.state.as_str(), "worker retired");
        Ok(())
    }

    /// Detach a reaped worker from its session record.
    fn release_session(&self, session_id: &str) {
        if let Ok(mut session) = self.store.get_session(session_id) {
            session.container_id = None;
            if let Err(e) = self.store.put_session(&session) {
                warn!(session = session_id, error = %e, "could not release session");
            }
        }
    }
}

/// Stop and remove every warm worker. Used by `pool cleanup` and daemon
/// shutdown; claimed workers are left to their sessions.
pub async fn cleanup_warm<E: Engine>(
    engine: &E,
    store: &StateStore,
    stop_grace: Duration,
) -> Result<usize> {
    let mut removed = 0;
    for worker in store.list_warm()? {
        let name = WorkerName::parse(&worker.name)?;
        let _ = engine
            .call(EngineCall::Stop { container: name.clone(), grace_secs: stop_grace.as_secs() })
            .await;
        engine.call(EngineCall::Rm { container: name, force: true }).await?;
        store.delete_worker(&worker)?;
        let _ = std::fs::remove_file(&worker.tmux_socket_path);
        crate::workspace::remove(&store.workspaces_dir(), &worker.workspace_path)?;
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
