// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hal_core::{FakeClock, ImageAllowlist, Profile, ResourceLimits, Session};
use hal_engine::FakeEngine;
use std::path::PathBuf;

struct Fixture {
    _dir: tempfile::TempDir,
    engine: Arc<FakeEngine>,
    store: StateStore,
    clock: FakeClock,
    spawner: Arc<WorkerSpawner<FakeEngine, FakeClock>>,
    pool: PoolManager<FakeEngine, FakeClock>,
}

fn fixture(config: PoolConfig) -> Fixture {
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
    let pool = PoolManager::new(
        Arc::clone(&engine),
        store.clone(),
        Arc::clone(&spawner),
        config,
        clock.clone(),
    );
    Fixture { _dir: dir, engine, store, clock, spawner, pool }
}

fn config() -> PoolConfig {
    PoolConfig {
        min_warm: 2,
        max_warm: 5,
        idle_timeout: Duration::from_secs(300),
        check_interval: Duration::from_secs(30),
        stop_grace: Duration::from_secs(10),
    }
}

#[tokio::test]
async fn scales_up_to_the_floor() {
    let f = fixture(config());
    let report = f.pool.tick().await.unwrap();
    assert_eq!(report.spawned, 2);
    assert_eq!(f.store.list_warm().unwrap().len(), 2);
    assert_eq!(f.engine.containers().len(), 2);
}

#[tokio::test]
async fn steady_state_tick_is_a_no_op() {
    let f = fixture(config());
    f.pool.tick().await.unwrap();
    let report = f.pool.tick().await.unwrap();
    assert_eq!(report, TickReport::default());
    assert_eq!(f.store.list_warm().unwrap().len(), 2);
}

#[tokio::test]
async fn scales_down_oldest_first() {
    let mut cfg = config();
    cfg.min_warm = 0;
    cfg.max_warm = 1;
    let f = fixture(cfg);

    // Seed three warm workers with distinct ages.
    for _ in 0..3 {
        f.clock.advance(Duration::from_secs(1));
        f.spawner.spawn_warm_worker().await.unwrap();
    }
    let oldest = f.store.list_warm().unwrap()[0].name.clone();

    let report = f.pool.tick().await.unwrap();
    assert_eq!(report.retired, 2);
    let survivors = f.store.list_warm().unwrap();
    assert_eq!(survivors.len(), 1);
    assert!(survivors.iter().all(|w| w.name != oldest), "oldest must go first");
}

#[tokio::test]
async fn drops_records_for_vanished_containers() {
    let f = fixture(config());
    f.pool.tick().await.unwrap();

    let victim = f.store.list_warm().unwrap()[0].name.clone();
    f.engine.remove_container(&victim);

    let report = f.pool.tick().await.unwrap();
    assert_eq!(report.dropped, 1);
    // The same tick refills the pool to the floor.
    assert_eq!(report.spawned, 1);
    assert_eq!(f.store.list_warm().unwrap().len(), 2);
}

#[tokio::test]
async fn stale_busy_worker_ages_to_idle_then_reaps() {
    let mut cfg = config();
    cfg.min_warm = 0;
    cfg.idle_timeout = Duration::from_secs(2);
    let f = fixture(cfg);

    let session = Session::new(
        "hal-9000-proj-0a1b2c3d",
        PathBuf::from("/tmp/proj"),
        Profile::Base,
        ResourceLimits::default(),
        f.clock.epoch_ms(),
    );
    let mut session = session;
    session.container_id = Some("id-w".to_string());
    f.store.put_session(&session).unwrap();

    let (record, _) = f.spawner.spawn_session_worker(&session).await.unwrap();
    assert_eq!(record.state, WorkerState::Busy);

    // Within the timeout: untouched.
    f.clock.advance(Duration::from_secs(1));
    assert_eq!(f.pool.tick().await.unwrap(), TickReport::default());

    // Past the timeout: busy ages to idle.
    f.clock.advance(Duration::from_secs(2));
    let report = f.pool.tick().await.unwrap();
    assert_eq!(report.idled, 1);
    assert_eq!(
        f.store.get_worker_for_session(&session.id).unwrap().state,
        WorkerState::Idle
    );

    // Past the timeout again: the idle worker is reaped, the container is
    // removed, and the session is released.
    f.clock.advance(Duration::from_secs(3));
    let report = f.pool.tick().await.unwrap();
    assert_eq!(report.reaped, 1);
    assert!(f.store.get_worker_for_session(&session.id).is_err());
    assert!(f.engine.containers().is_empty());
    assert!(f.store.get_session(&session.id).unwrap().container_id.is_none());
}

#[tokio::test]
async fn engine_outage_surfaces_engine_unavailable() {
    let f = fixture(config());
    f.pool.tick().await.unwrap();
    f.engine.set_unavailable(true);
    let err = f.pool.tick().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineUnavailable);
}

#[tokio::test]
async fn retire_survives_a_failed_stop() {
    let mut cfg = config();
    cfg.min_warm = 0;
    cfg.max_warm = 0;
    let f = fixture(cfg);
    f.spawner.spawn_warm_worker().await.unwrap();
    f.engine.fail_op("stop", "already exited");

    let report = f.pool.tick().await.unwrap();
    assert_eq!(report.retired, 1);
    assert!(f.engine.containers().is_empty());
    // The pool-owned workspace goes with the worker.
    assert!(std::fs::read_dir(f.store.workspaces_dir()).unwrap().next().is_none());
}
