// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cold-spawn lifecycle: session records, worker contract, stop/respawn.

use super::support::default_harness;
use hal_core::{Session, WorkerState};
use hal_engine::EngineCall;

#[tokio::test]
async fn cold_spawn_writes_session_file_and_contract_worker() {
    let h = default_harness();
    let proj = h.project("proj");

    let outcome = h.api.spawn(&proj, Some("base"), None).await.unwrap();
    assert!(outcome.created);

    // One session file under sessions/, parseable, with the right profile.
    let path = h.store.session_path(&outcome.session.id);
    assert!(path.exists());
    let parsed: Session =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(parsed.profile.as_str(), "base");
    assert_eq!(parsed.resource_limits.memory, "4g");
    assert_eq!(parsed.resource_limits.cpus, 2.0);
    assert_eq!(parsed.resource_limits.pids, 100);

    // The one run call carries the worker container contract.
    let run = h
        .engine
        .calls()
        .into_iter()
        .find_map(|c| match c {
            EngineCall::Run(spec) => Some(spec),
            _ => None,
        })
        .unwrap();
    assert_eq!(run.network_mode, "container:hal9000-parent");
    assert_eq!(run.limits.memory, "4g");
    assert_eq!(run.limits.cpus, 2.0);
    assert_eq!(run.limits.pids, 100);
    assert!(run
        .mounts
        .iter()
        .any(|m| m.target == std::path::Path::new("/workspace") && !m.read_only));
    assert!(run.user.is_some(), "workers run as a non-root uid");

    let argv = EngineCall::Run(run).argv();
    assert!(!argv.iter().any(|a| a == "-p" || a == "--publish"), "no published host ports");
}

#[tokio::test]
async fn stop_then_spawn_keeps_the_session_identity() {
    let h = default_harness();
    let proj = h.project("proj");

    let first = h.api.spawn(&proj, None, None).await.unwrap();
    h.api.stop(&first.session.id).await.unwrap();
    assert!(h.engine.containers().is_empty());

    let second = h.api.spawn(&proj, None, None).await.unwrap();
    assert!(second.created);
    assert_eq!(second.session.id, first.session.id);
}

#[tokio::test]
async fn detach_then_reattach_roundtrips_worker_state() {
    let h = default_harness();
    let proj = h.project("proj");

    let outcome = h.api.spawn(&proj, None, None).await.unwrap();
    let id = outcome.session.id;

    h.api.detached(&id).await.unwrap();
    assert_eq!(h.store.get_worker_for_session(&id).unwrap().state, WorkerState::Idle);

    h.api.attach(&id).await.unwrap();
    assert_eq!(h.store.get_worker_for_session(&id).unwrap().state, WorkerState::Busy);
}
