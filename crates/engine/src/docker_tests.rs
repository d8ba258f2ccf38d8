// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hal_core::{ErrorKind, WorkerName};

#[tokio::test]
async fn missing_socket_is_engine_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let engine = DockerEngine::new(dir.path().join("no-such.sock"), Duration::from_secs(1));

    let err = engine
        .call(EngineCall::Inspect {
            container: WorkerName::parse("w").unwrap(),
            format: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineUnavailable);
}

#[tokio::test]
async fn probe_fails_without_socket() {
    let dir = tempfile::tempdir().unwrap();
    let engine = DockerEngine::new(dir.path().join("no-such.sock"), Duration::from_secs(1));
    let err = engine.probe().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineUnavailable);
}
