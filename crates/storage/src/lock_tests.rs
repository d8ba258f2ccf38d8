// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hal_core::ErrorKind;

#[test]
fn acquire_creates_and_drop_removes_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("record.json");
    let sidecar = dir.path().join("record.json.lock");

    let guard = LockGuard::acquire(&target).unwrap();
    assert!(sidecar.exists());
    drop(guard);
    assert!(!sidecar.exists());
}

#[test]
fn second_acquire_conflicts_while_held() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("record.json");

    let _guard = LockGuard::acquire(&target).unwrap();
    let err = LockGuard::acquire(&target).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn reacquire_after_release_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("record.json");

    drop(LockGuard::acquire(&target).unwrap());
    assert!(LockGuard::acquire(&target).is_ok());
}
