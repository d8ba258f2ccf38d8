// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic session naming.

use sha2::{Digest, Sha256};

use crate::validate::ProjectPath;

/// Prefix shared by every derived session name.
pub const SESSION_PREFIX: &str = "hal-9000";

/// Derive the stable session name for a project directory.
///
/// `hal-9000-<basename>-<hash8>`: the final path segment lower-cased with
/// non-`[a-z0-9_-]` runs replaced by a single hyphen, plus the first 8 hex
/// chars of SHA-256 over the canonical absolute path bytes. The same
/// canonical path always yields the same name, and the result is a valid
/// engine container name.
pub fn derive_session_name(path: &ProjectPath) -> String {
    let basename = path
        .as_path()
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut slug = slug_segment(&basename);
    if slug.is_empty() {
        // Filesystem root or a fully non-ASCII segment; the hash still
        // disambiguates.
        slug = "project".to_string();
    }
    let digest = Sha256::digest(path.as_path().as_os_str().as_encoded_bytes());
    let hex = format!("{:x}", digest);
    format!("{}-{}-{}", SESSION_PREFIX, slug, &hex[..8])
}

/// Lowercase, map non-`[a-z0-9_-]` runs to a single hyphen, trim hyphens.
fn slug_segment(input: &str) -> String {
    let lower = input.to_lowercase();
    let mut slug = String::with_capacity(lower.len());
    let mut last_was_hyphen = false;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            slug.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    slug.trim_matches('-').to_string()
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;
