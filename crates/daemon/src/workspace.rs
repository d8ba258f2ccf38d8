// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pooled-worker workspace provisioning.
//!
//! A warm worker cannot bind-mount a project it has not met yet, and a
//! claim is a rename, so each warm worker mounts its own directory under
//! `workspaces/` and the claim delivers the project into it.

use std::path::Path;
use std::time::Duration;

use hal_core::{Error, Result};

/// Upper bound on one project delivery.
const DELIVER_TIMEOUT: Duration = Duration::from_secs(120);

/// Create the per-worker workspace directory.
pub(crate) fn create(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Copy the project tree into a pooled workspace, preserving modes and
/// symlinks. The worker sees the result at `/workspace` immediately; the
/// session record keeps the host project path.
pub(crate) async fn deliver_project(project: &Path, workspace: &Path) -> Result<()> {
    if !workspace.is_dir() {
        return Err(Error::Internal(format!(
            "workspace {} does not exist",
            workspace.display()
        )));
    }

    let mut source = project.as_os_str().to_owned();
    source.push("/.");
    let mut cmd = tokio::process::Command::new("cp");
    cmd.arg("-a").arg(&source).arg(workspace);

    let output = tokio::time::timeout(DELIVER_TIMEOUT, cmd.output())
        .await
        .map_err(|_| {
            Error::Timeout(format!("project delivery exceeded {:?}", DELIVER_TIMEOUT))
        })?
        .map_err(|e| Error::Internal(format!("failed to run cp: {}", e)))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(Error::Internal(format!(
            "project delivery failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

/// Remove a pool-owned workspace. Paths outside `workspaces_root` are left
/// alone: a cold-spawned worker's workspace IS the user's project.
pub(crate) fn remove(workspaces_root: &Path, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() || !path.starts_with(workspaces_root) {
        return Ok(());
    }
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
