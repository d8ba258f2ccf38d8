// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supply-chain allowlist for worker images.
//!
//! The allowlist is loaded once at bootstrap and immutable afterwards.
//! Membership is byte-for-byte: no prefix match, no glob, and a tag-only
//! reference does not satisfy a digest-pinned entry.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validate::Profile;

/// Image reference admitted by the allowlist.
///
/// Only [`ImageAllowlist::resolve`] constructs one, so an engine `run` can
/// never be issued for an unlisted image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Worker images shipped with the orchestrator, one per profile.
const DEFAULT_IMAGES: &[&str] = &[
    "ghcr.io/hellblazer/hal-9000:worker",
    "ghcr.io/hellblazer/hal-9000:worker-python",
    "ghcr.io/hellblazer/hal-9000:worker-node",
    "ghcr.io/hellblazer/hal-9000:worker-java",
];

/// Ordered, immutable set of image references permitted for workers.
#[derive(Debug, Clone)]
pub struct ImageAllowlist {
    entries: Vec<String>,
}

impl ImageAllowlist {
    /// The compiled-in default entries.
    pub fn builtin() -> Self {
        Self { entries: DEFAULT_IMAGES.iter().map(|s| s.to_string()).collect() }
    }

    /// Built-in entries plus one reference per non-comment line of `path`,
    /// when the file exists. Order is preserved; the first entry is the
    /// default worker image.
    pub fn load(path: &Path) -> Result<Self> {
        let mut list = Self::builtin();
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if !list.entries.iter().any(|e| e == line) {
                    list.entries.push(line.to_string());
                }
            }
        }
        Ok(list)
    }

    /// An allowlist with exactly the given entries, first entry default.
    pub fn from_entries(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Byte-for-byte membership check.
    pub fn resolve(&self, reference: &str) -> Result<ImageRef> {
        if self.entries.iter().any(|e| e == reference) {
            Ok(ImageRef(reference.to_string()))
        } else {
            Err(Error::PolicyDenied(format!("image {:?} is not in the allowlist", reference)))
        }
    }

    /// The default worker image reference (first entry).
    pub fn default_reference(&self) -> &str {
        // builtin() guarantees at least the default entries
        self.entries.first().map(String::as_str).unwrap_or(DEFAULT_IMAGES[0])
    }

    /// The conventional image reference for a profile. Still subject to
    /// [`resolve`](Self::resolve) before any engine call.
    pub fn reference_for(&self, profile: Profile) -> String {
        match profile {
            Profile::Base => self.default_reference().to_string(),
            other => format!("ghcr.io/hellblazer/hal-9000:worker-{}", other.as_str()),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl Default for ImageAllowlist {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
#[path = "allowlist_tests.rs"]
mod tests;
