// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation precedence and allowlist closure.

use super::support::default_harness;
use hal_core::ErrorKind;
use hal_engine::EngineCall;

#[tokio::test]
async fn traversal_name_override_is_rejected_before_any_engine_call() {
    let h = default_harness();
    let proj = h.project("proj");

    let err = h.api.spawn(&proj, None, Some("../evil")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(h.engine.calls().is_empty(), "no engine call may precede validation");
}

#[tokio::test]
async fn empty_project_path_is_invalid_argument() {
    let h = default_harness();
    let err = h.api.spawn(std::path::Path::new(""), None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(h.engine.calls().is_empty());
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn blocked_system_root_is_policy_denied() {
    let h = default_harness();
    let err = h.api.spawn(std::path::Path::new("/proc/sys"), None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyDenied);
    assert!(h.engine.calls().is_empty());
}

#[tokio::test]
async fn every_run_uses_an_allowlisted_image() {
    let h = default_harness();
    for (i, profile) in ["base", "python", "node", "java"].iter().enumerate() {
        let proj = h.project(&format!("proj{}", i));
        h.api.spawn(&proj, Some(profile), None).await.unwrap();
    }
    h.spawner.spawn_warm_worker().await.unwrap();

    let allowlist = hal_core::ImageAllowlist::builtin();
    for call in h.engine.calls() {
        if let EngineCall::Run(spec) = call {
            assert!(
                allowlist.resolve(spec.image.as_str()).is_ok(),
                "run issued for unlisted image {}",
                spec.image
            );
        }
    }
}

#[tokio::test]
async fn bootstrap_refuses_an_unlisted_default_image() {
    use hal_core::{FakeClock, ImageAllowlist, ResourceLimits};
    use hal_daemon::pool::PoolConfig;
    use hal_daemon::services::VectorIndexConfig;
    use std::sync::Arc;
    use std::time::Duration;

    let dir = tempfile::tempdir().unwrap();
    let state_dir = dir.path().join("state");
    let config = hal_daemon::Config {
        socket_path: state_dir.join("daemon.sock"),
        lock_path: state_dir.join("daemon.lock"),
        tmux_dir: state_dir.join("tmux"),
        engine_socket: dir.path().join("docker.sock"),
        parent_container: "hal9000-parent".to_string(),
        worker_image: "alpine:latest".to_string(),
        allowlist: ImageAllowlist::builtin(),
        limits: ResourceLimits::default(),
        pool: PoolConfig::default(),
        vector_index: VectorIndexConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            data_dir: state_dir.join("chroma"),
        },
        engine_call_timeout: Duration::from_secs(30),
        readiness_deadline: Duration::from_millis(100),
        stop_grace: Duration::from_secs(10),
        skip_image_pull: true,
        lazy_image_pull: false,
        pool_manager_enabled: false,
        state_dir,
    };

    let engine = Arc::new(hal_engine::FakeEngine::new());
    let err = hal_daemon::bootstrap::startup_with_clock(config, Arc::clone(&engine), FakeClock::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyDenied);
    assert_eq!(engine.calls_for("run"), 0);
    assert_eq!(engine.calls_for("pull"), 0);
}
