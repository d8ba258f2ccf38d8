// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Warm pool scenarios: claim by rename, refill, idle reap.

use std::time::Duration;

use super::support::harness;
use hal_daemon::pool::PoolConfig;

fn pool_config(min: usize, max: usize, idle_secs: u64) -> PoolConfig {
    PoolConfig {
        min_warm: min,
        max_warm: max,
        idle_timeout: Duration::from_secs(idle_secs),
        check_interval: Duration::from_secs(1),
        stop_grace: Duration::from_secs(10),
    }
}

#[tokio::test]
async fn warm_claim_renames_and_pool_refills_within_one_tick() {
    let h = harness(pool_config(2, 5, 300));

    // First tick: two warm workers appear.
    h.pool.tick().await.unwrap();
    assert_eq!(h.store.list_warm().unwrap().len(), 2);
    let runs_after_warmup = h.engine.calls_for("run");

    // Spawn claims a warm worker: a rename, not a new run.
    let outcome = h.api.spawn(&h.project("proj"), None, None).await.unwrap();
    assert!(outcome.from_pool);
    assert_eq!(h.engine.calls_for("run"), runs_after_warmup);
    assert_eq!(h.engine.calls_for("rename"), 1);
    assert_eq!(h.store.list_warm().unwrap().len(), 1);

    // The next tick restores the floor.
    h.pool.tick().await.unwrap();
    assert_eq!(h.store.list_warm().unwrap().len(), 2);
}

#[tokio::test]
async fn claimed_worker_serves_the_session_that_claimed_it() {
    let h = harness(pool_config(1, 5, 300));
    h.pool.tick().await.unwrap();
    let warm_name = h.store.list_warm().unwrap()[0].name.clone();

    let proj = h.project("proj");
    std::fs::create_dir(proj.join("src")).unwrap();
    std::fs::write(proj.join("src/lib.rs"), "pub fn hal() {}\n").unwrap();

    let outcome = h.api.spawn(&proj, None, None).await.unwrap();
    let worker = h.store.get_worker_for_session(&outcome.session.id).unwrap();
    assert_eq!(worker.name, outcome.session.id);
    // Same multiplexer socket as the warm worker it was promoted from.
    assert!(worker
        .tmux_socket_path
        .to_string_lossy()
        .contains(&warm_name));

    // The claim delivered the project into the workspace the container has
    // mounted at /workspace since its warm spawn.
    assert!(worker.workspace_path.starts_with(h.store.workspaces_dir()));
    assert_eq!(
        std::fs::read_to_string(worker.workspace_path.join("src/lib.rs")).unwrap(),
        "pub fn hal() {}\n"
    );
}

#[tokio::test]
async fn idle_worker_is_reaped_after_the_timeout() {
    let h = harness(pool_config(0, 5, 2));
    let proj = h.project("proj");

    let outcome = h.api.spawn(&proj, None, None).await.unwrap();
    let id = outcome.session.id;
    h.api.detached(&id).await.unwrap();

    // Before the timeout the worker survives.
    h.clock.advance(Duration::from_secs(1));
    h.pool.tick().await.unwrap();
    assert!(h.store.get_worker_for_session(&id).is_ok());

    // After the timeout the record is gone and the container removed.
    h.clock.advance(Duration::from_secs(3));
    let report = h.pool.tick().await.unwrap();
    assert_eq!(report.reaped, 1);
    assert!(h.store.get_worker_for_session(&id).is_err());
    assert!(h.engine.containers().is_empty());

    // The session survives with no bound container, and reaping a
    // cold-spawned worker never touches the user's project directory.
    assert!(h.store.get_session(&id).unwrap().container_id.is_none());
    assert!(proj.is_dir());
}

#[tokio::test]
async fn pool_respects_the_ceiling() {
    let h = harness(pool_config(0, 2, 300));
    for _ in 0..4 {
        h.clock.advance(Duration::from_secs(1));
        h.spawner.spawn_warm_worker().await.unwrap();
    }

    h.pool.tick().await.unwrap();
    assert_eq!(h.store.list_warm().unwrap().len(), 2);
    assert_eq!(h.engine.containers().len(), 2);
}
