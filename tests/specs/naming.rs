// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-name determinism across call sites and paths.

use hal_core::{derive_session_name, ProjectPath};

#[test]
fn hundred_derivations_agree() {
    let dir = tempfile::tempdir().unwrap();
    let proj = dir.path().join("proj");
    std::fs::create_dir(&proj).unwrap();
    let path = ProjectPath::canonicalize(&proj).unwrap();

    let first = derive_session_name(&path);
    let (_, hash) = first.rsplit_once('-').unwrap();
    assert_eq!(hash.len(), 8);
    for _ in 0..100 {
        assert_eq!(derive_session_name(&path), first);
    }
}

#[test]
fn case_distinct_paths_get_distinct_names() {
    let dir = tempfile::tempdir().unwrap();
    let lower = dir.path().join("proj");
    let upper = dir.path().join("Proj");
    std::fs::create_dir(&lower).unwrap();
    std::fs::create_dir(&upper).unwrap();

    let lower_name = derive_session_name(&ProjectPath::canonicalize(&lower).unwrap());
    let upper_name = derive_session_name(&ProjectPath::canonicalize(&upper).unwrap());
    assert_ne!(lower_name, upper_name);
    // Both slug to the same basename; only the hash tells them apart.
    let strip = |s: &str| s.rsplit_once('-').map(|(head, _)| head.to_string()).unwrap();
    assert_eq!(strip(&lower_name), strip(&upper_name));
}

#[test]
fn relative_and_canonical_spellings_agree() {
    let dir = tempfile::tempdir().unwrap();
    let proj = dir.path().join("proj");
    std::fs::create_dir(&proj).unwrap();

    let direct = ProjectPath::canonicalize(&proj).unwrap();
    let indirect = ProjectPath::canonicalize(&dir.path().join(".").join("proj")).unwrap();
    assert_eq!(derive_session_name(&direct), derive_session_name(&indirect));
}
