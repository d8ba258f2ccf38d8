// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation boundary between untrusted CLI arguments and the engine.
//!
//! Every input that ends up in an engine-command argument passes through one
//! of these constructors first. The wrappers are deliberately opaque: the
//! engine call sites take `WorkerName`/`ProjectPath`/`Profile` values, so an
//! unvalidated string cannot reach them by construction.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// System roots no project directory may resolve into.
const BLOCKED_ROOTS: &[&str] = &["/proc", "/sys", "/dev", "/etc", "/boot", "/root"];

/// Validated worker/container name: non-empty, `[A-Za-z0-9_-]` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerName(String);

impl WorkerName {
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidArgument("worker name is empty".to_string()));
        }
        if !s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
            return Err(Error::InvalidArgument(format!(
                "worker name {:?} contains characters outside [A-Za-z0-9_-]",
                s
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for WorkerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Allowed worker image flavor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Base,
    Python,
    Node,
    Java,
}

impl Profile {
    /// Accepts only `[A-Za-z0-9-]` strings naming a known profile.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(Error::InvalidArgument(format!("malformed profile name {:?}", s)));
        }
        match s {
            "base" => Ok(Profile::Base),
            "python" => Ok(Profile::Python),
            "node" => Ok(Profile::Node),
            "java" => Ok(Profile::Java),
            _ => Err(Error::InvalidArgument(format!(
                "unknown profile {:?} (expected base, python, node or java)",
                s
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Base => "base",
            Profile::Python => "python",
            Profile::Node => "node",
            Profile::Java => "java",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonicalized project directory, checked against the blocked system roots.
///
/// Construction performs no filesystem operation beyond path resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectPath(PathBuf);

impl ProjectPath {
    pub fn canonicalize(raw: &Path) -> Result<Self> {
        if raw.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("project path is empty".to_string()));
        }
        let resolved = raw.canonicalize().map_err(|e| {
            Error::InvalidArgument(format!("project path {}: {}", raw.display(), e))
        })?;
        if !resolved.is_dir() {
            return Err(Error::InvalidArgument(format!(
                "project path {} is not a directory",
                resolved.display()
            )));
        }
        // canonicalize() resolves symlinks; a surviving `..` means the
        // resolution itself escaped and cannot be trusted.
        if resolved.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(Error::InvalidArgument(format!(
                "project path {} contains `..` after resolution",
                resolved.display()
            )));
        }
        for root in BLOCKED_ROOTS {
            if resolved.starts_with(root) {
                return Err(Error::PolicyDenied(format!(
                    "project path {} is under blocked root {}",
                    resolved.display(),
                    root
                )));
            }
        }
        Ok(Self(resolved))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
