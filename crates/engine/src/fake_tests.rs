// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::container_exists;
use hal_core::{ErrorKind, ImageAllowlist, ResourceLimits, WorkerName};

fn run_call(name: &str) -> EngineCall {
    EngineCall::Run(crate::RunSpec {
        name: WorkerName::parse(name).unwrap(),
        image: ImageAllowlist::builtin().resolve("ghcr.io/hellblazer/hal-9000:worker").unwrap(),
        network_mode: "container:hal9000-parent".to_string(),
        limits: ResourceLimits::default(),
        mounts: vec![],
        user: None,
        env: vec![],
        command: vec![],
    })
}

#[tokio::test]
async fn run_then_rename_then_rm_tracks_the_table() {
    let engine = FakeEngine::new();
    engine.call(run_call("warm-1")).await.unwrap();
    assert_eq!(engine.containers(), vec!["warm-1"]);

    engine
        .call(EngineCall::Rename {
            container: WorkerName::parse("warm-1").unwrap(),
            new_name: WorkerName::parse("session-1").unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(engine.containers(), vec!["session-1"]);

    engine
        .call(EngineCall::Rm { container: WorkerName::parse("session-1").unwrap(), force: true })
        .await
        .unwrap();
    assert!(engine.containers().is_empty());
}

#[tokio::test]
async fn duplicate_run_is_engine_error() {
    let engine = FakeEngine::new();
    engine.call(run_call("w")).await.unwrap();
    let err = engine.call(run_call("w")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineError);
}

#[tokio::test]
async fn container_exists_maps_inspect_errors() {
    let engine = FakeEngine::new();
    let name = WorkerName::parse("w").unwrap();
    assert!(!container_exists(&engine, &name).await.unwrap());
    engine.add_container("w");
    assert!(container_exists(&engine, &name).await.unwrap());

    engine.set_unavailable(true);
    let err = container_exists(&engine, &name).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineUnavailable);
}

#[tokio::test]
async fn scripted_failures_apply_per_op() {
    let engine = FakeEngine::new();
    engine.add_container("w");
    engine.fail_op("stop", "cannot stop");
    let err = engine
        .call(EngineCall::Stop { container: WorkerName::parse("w").unwrap(), grace_secs: 10 })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "engine stop failed: cannot stop");

    engine.clear_failures();
    assert!(engine
        .call(EngineCall::Stop { container: WorkerName::parse("w").unwrap(), grace_secs: 10 })
        .await
        .is_ok());
}

#[tokio::test]
async fn calls_are_recorded_in_order() {
    let engine = FakeEngine::new();
    let _ = engine.call(run_call("w")).await;
    let _ = engine
        .call(EngineCall::Inspect { container: WorkerName::parse("w").unwrap(), format: None })
        .await;
    let ops: Vec<_> = engine.calls().iter().map(|c| c.op()).collect();
    assert_eq!(ops, vec!["run", "inspect"]);
    assert_eq!(engine.calls_for("run"), 1);
}
