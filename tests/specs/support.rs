// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture: a daemon context wired to the fake engine.

use std::sync::Arc;
use std::time::Duration;

use hal_core::{FakeClock, ImageAllowlist, ResourceLimits};
use hal_daemon::coordinator::Coordinator;
use hal_daemon::pool::{PoolConfig, PoolManager};
use hal_daemon::sessions::SessionApi;
use hal_daemon::spawner::WorkerSpawner;
use hal_engine::FakeEngine;
use hal_storage::StateStore;

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub engine: Arc<FakeEngine>,
    pub store: StateStore,
    pub clock: FakeClock,
    pub spawner: Arc<WorkerSpawner<FakeEngine, FakeClock>>,
    pub api: SessionApi<FakeEngine, FakeClock>,
    pub pool: PoolManager<FakeEngine, FakeClock>,
}

pub fn harness(pool_config: PoolConfig) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open(dir.path().join("state")).unwrap();
    let engine = Arc::new(FakeEngine::new());
    let clock = FakeClock::new();
    let spawner = Arc::new(WorkerSpawner::new(
        Arc::clone(&engine),
        store.clone(),
        ImageAllowlist::builtin(),
        "hal9000-parent".to_string(),
        dir.path().join("tmux"),
        "ghcr.io/hellblazer/hal-9000:worker".to_string(),
        ResourceLimits::default(),
        clock.clone(),
    ));
    let coordinator = Arc::new(Coordinator::new(
        Arc::clone(&engine),
        store.clone(),
        clock.clone(),
        Duration::from_secs(10),
    ));
    let api = SessionApi::new(
        Arc::clone(&engine),
        store.clone(),
        Arc::clone(&spawner),
        Arc::clone(&coordinator),
        ResourceLimits::default(),
        clock.clone(),
    );
    let pool = PoolManager::new(
        Arc::clone(&engine),
        store.clone(),
        Arc::clone(&spawner),
        pool_config,
        clock.clone(),
    );
    Harness { dir, engine, store, clock, spawner, api, pool }
}

pub fn default_harness() -> Harness {
    harness(PoolConfig::default())
}

impl Harness {
    /// Create a project directory inside the harness temp dir.
    pub fn project(&self, name: &str) -> std::path::PathBuf {
        let path = self.dir.path().join(name);
        if !path.exists() {
            std::fs::create_dir(&path).unwrap();
        }
        path
    }
}
