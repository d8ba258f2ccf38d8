// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State directory layout and record persistence.
//!
//! ```text
//! <root>/
//!   sessions/<session-id>.json
//!   pool/workers/warm/<worker-name>.json
//!   pool/workers/claimed/<session-id>.json
//!   pool/pool-manager.pid
//!   workspaces/<worker-name>/
//!   logs/
//!   secrets/
//! ```

use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

use hal_core::{Error, Result, Session, WorkerRecord, WorkerState};
use tracing::warn;

use crate::lock::LockGuard;

/// Directory-backed store for session and worker records.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    /// Open the store, creating the layout with mode 0700 as needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { root: root.into() };
        for dir in [
            store.root.clone(),
            store.sessions_dir(),
            store.warm_dir(),
            store.claimed_dir(),
            store.workspaces_dir(),
            store.logs_dir(),
            store.secrets_dir(),
        ] {
            if !dir.exists() {
                std::fs::DirBuilder::new().recursive(true).mode(0o700).create(&dir)?;
            }
        }
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn warm_dir(&self) -> PathBuf {
        self.root.join("pool").join("workers").join("warm")
    }

    pub fn claimed_dir(&self) -> PathBuf {
        self.root.join("pool").join("workers").join("claimed")
    }

    /// Pool-owned workspace directories, one per warm worker.
    pub fn workspaces_dir(&self) -> PathBuf {
        self.root.join("workspaces")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn secrets_dir(&self) -> PathBuf {
        self.root.join("secrets")
    }

    pub fn pool_pid_path(&self) -> PathBuf {
        self.root.join("pool").join("pool-manager.pid")
    }

    // ----- sessions -----

    pub fn session_path(&self, id: &str) -> PathBuf {
        self.sessions_dir().join(format!("{}.json", id))
    }

    pub fn put_session(&self, session: &Session) -> Result<()> {
        write_json(&self.session_path(&session.id), session)
    }

    pub fn get_session(&self, id: &str) -> Result<Session> {
        read_json(&self.session_path(id))
            .ok_or_else(|| Error::NotFound(format!("session {}", id)))
    }

    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = read_dir_json(&self.sessions_dir())?;
        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sessions)
    }

    pub fn delete_session(&self, id: &str) -> Result<()> {
        remove_if_exists(&self.session_path(id))
    }

    /// Serialize spawn for one session id across processes.
    ///
    /// Distinct from the record's own write sidecar, so holding the claim
    /// lock while rewriting the session file cannot deadlock.
    pub fn lock_session(&self, id: &str) -> Result<LockGuard> {
        LockGuard::acquire(&self.sessions_dir().join(format!("{}.spawn", id)))
    }

    // ----- workers -----

    /// Where a worker record lives, determined by its state.
    pub fn worker_path(&self, record: &WorkerRecord) -> Result<PathBuf> {
        match record.state {
            WorkerState::Warm => Ok(self.warm_dir().join(format!("{}.json", record.name))),
            _ => {
                let session = record.session_id.as_deref().ok_or_else(|| {
                    Error::Internal(format!(
                        "worker {} is {} but has no session",
                        record.name,
                        record.state.as_str()
                    ))
                })?;
                Ok(self.claimed_dir().join(format!("{}.json", session)))
            }
        }
    }

    pub fn put_worker(&self, record: &WorkerRecord) -> Result<()> {
        write_json(&self.worker_path(record)?, record)
    }

    /// All worker records, warm and claimed.
    pub fn list_workers(&self) -> Result<Vec<WorkerRecord>> {
        let mut workers: Vec<WorkerRecord> = read_dir_json(&self.warm_dir())?;
        workers.extend(read_dir_json::<WorkerRecord>(&self.claimed_dir())?);
        workers.sort_by_key(|w| (w.created_at_ms, w.name.clone()));
        Ok(workers)
    }

    pub fn list_warm(&self) -> Result<Vec<WorkerRecord>> {
        let mut warm: Vec<WorkerRecord> = read_dir_json(&self.warm_dir())?;
        warm.sort_by_key(|w| (w.created_at_ms, w.name.clone()));
        Ok(warm)
    }

    pub fn get_worker_for_session(&self, session_id: &str) -> Result<WorkerRecord> {
        read_json(&self.claimed_dir().join(format!("{}.json", session_id)))
            .ok_or_else(|| Error::NotFound(format!("no worker bound to session {}", session_id)))
    }

    pub fn delete_worker(&self, record: &WorkerRecord) -> Result<()> {
        remove_if_exists(&self.worker_path(record)?)
    }

    /// Atomically claim the oldest warm worker for `session_id`.
    ///
    /// The rename from `warm/` into `claimed/` is the race arbiter: when two
    /// claimers chase the same warm file, one rename succeeds and the loser
    /// moves on to the next candidate, finally returning `None` so the
    /// caller falls through to a cold spawn. FIFO by `created_at_ms`.
    pub fn claim_warm(&self, session_id: &str, now_ms: u64) -> Result<Option<WorkerRecord>> {
        let dest = self.claimed_dir().join(format!("{}.json", session_id));
        for candidate in self.list_warm()? {
            let src = self.warm_dir().join(format!("{}.json", candidate.name));
            match std::fs::rename(&src, &dest) {
                Ok(()) => {
                    let mut record = candidate;
                    record.state = WorkerState::Claimed;
                    record.session_id = Some(session_id.to_string());
                    record.last_attached_at_ms = now_ms;
                    write_json(&dest, &record)?;
                    return Ok(Some(record));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    // Lost the race for this candidate; try the next.
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }

    // ----- pool manager pid -----

    pub fn write_pool_pid(&self, pid: u32) -> Result<()> {
        std::fs::write(self.pool_pid_path(), format!("{}\n", pid))?;
        Ok(())
    }

    pub fn read_pool_pid(&self) -> Option<u32> {
        std::fs::read_to_string(self.pool_pid_path()).ok()?.trim().parse().ok()
    }

    pub fn clear_pool_pid(&self) {
        let _ = std::fs::remove_file(self.pool_pid_path());
    }

    // ----- secrets -----

    /// Read an API-key secret placed by the front-end. The file must be
    /// private to the user (no group/other bits); anything looser is
    /// refused rather than silently accepted.
    pub fn read_secret(&self, name: &str) -> Result<String> {
        let path = self.secrets_dir().join(name);
        if !path.exists() {
            return Err(Error::NotFound(format!("secret {}", name)));
        }
        let mode = path.metadata()?.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(Error::PolicyDenied(format!(
                "secret {} is mode {:o}; must be 0600",
                name,
                mode & 0o777
            )));
        }
        Ok(std::fs::read_to_string(&path)?.trim().to_string())
    }
}

/// Write-tmp-then-rename under the file's lock sidecar.
fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let _guard = LockGuard::acquire(path)?;
    let dir = path
        .parent()
        .ok_or_else(|| Error::Internal(format!("{} has no parent directory", path.display())))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Internal(format!("{} has no file name", path.display())))?;
    let tmp = dir.join(format!(".{}.tmp", file_name));

    let bytes = serde_json::to_vec_pretty(value)?;
    {
        use std::io::Write;
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(&bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = std::fs::read(path).ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable state file");
            None
        }
    }
}

fn read_dir_json<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut out = Vec::new();
    if !dir.exists() {
        return Ok(out);
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".json") || name.starts_with('.') {
            continue;
        }
        if let Some(value) = read_json(&path) {
            out.push(value);
        }
    }
    Ok(out)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
