// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::ErrorKind;
use yare::parameterized;

#[parameterized(
    plain = { "worker1" },
    underscores = { "my_worker" },
    hyphens = { "hal-9000-proj-abcd1234" },
    mixed_case = { "Worker-A_1" },
)]
fn worker_name_accepts(name: &str) {
    assert!(WorkerName::parse(name).is_ok());
}

#[parameterized(
    empty = { "" },
    dotdot = { ".." },
    shell_subst = { "$(whoami)" },
    space = { "a b" },
    slash = { "a/b" },
    semicolon = { "a;b" },
    unicode = { "wörker" },
)]
fn worker_name_rejects(name: &str) {
    let err = WorkerName::parse(name).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[parameterized(
    base = { "base", Profile::Base },
    python = { "python", Profile::Python },
    node = { "node", Profile::Node },
    java = { "java", Profile::Java },
)]
fn profile_accepts_known(name: &str, expected: Profile) {
    assert_eq!(Profile::parse(name).unwrap(), expected);
}

#[parameterized(
    empty = { "" },
    unknown = { "rust" },
    uppercase = { "Base" },
    underscore = { "ba_se" },
    injection = { "base;rm" },
)]
fn profile_rejects(name: &str) {
    let err = Profile::parse(name).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn project_path_empty_is_invalid_argument() {
    let err = ProjectPath::canonicalize(Path::new("")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn project_path_missing_is_invalid_argument() {
    let err = ProjectPath::canonicalize(Path::new("/nonexistent/proj-xyz")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn project_path_file_is_invalid_argument() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, b"x").unwrap();
    let err = ProjectPath::canonicalize(&file).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn project_path_resolves_dot_dot_before_checking() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("a");
    std::fs::create_dir(&sub).unwrap();
    let indirect = sub.join("..").join("a");
    let p = ProjectPath::canonicalize(&indirect).unwrap();
    assert!(!p.as_path().components().any(|c| matches!(c, Component::ParentDir)));
}

#[cfg(target_os = "linux")]
#[test]
fn project_path_under_proc_is_policy_denied() {
    let err = ProjectPath::canonicalize(Path::new("/proc/sys")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyDenied);
}

#[cfg(target_os = "linux")]
#[test]
fn symlink_into_blocked_root_is_policy_denied() {
    let dir = tempfile::tempdir().unwrap();
    let link = dir.path().join("sneaky");
    std::os::unix::fs::symlink("/etc", &link).unwrap();
    let err = ProjectPath::canonicalize(&link).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyDenied);
}

#[test]
fn blocked_root_match_is_component_wise() {
    // A directory merely *named* like a blocked root must not be denied.
    let dir = tempfile::tempdir().unwrap();
    let lookalike = dir.path().join("etcetera");
    std::fs::create_dir(&lookalike).unwrap();
    assert!(ProjectPath::canonicalize(&lookalike).is_ok());
}
