// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-file lock sidecars.

use std::path::PathBuf;
use std::time::Duration;

use hal_core::{Error, Result};

/// How long a sidecar may exist before it is presumed abandoned by a dead
/// writer and broken.
const STALE_AFTER: Duration = Duration::from_secs(30);

/// Retry cadence while another writer holds the sidecar.
const RETRY_EVERY: Duration = Duration::from_millis(25);
const RETRY_FOR: Duration = Duration::from_secs(2);

/// Exclusive-create lock sidecar, released on drop.
///
/// Writers hold the guard only across the single file they are writing;
/// never across an engine call or any other suspension point.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    /// Acquire `<path>.lock` via `O_EXCL` create, retrying briefly if a
    /// live writer holds it and breaking it when it has gone stale.
    pub fn acquire(target: &std::path::Path) -> Result<Self> {
        let path = sidecar_path(target);
        let deadline = std::time::Instant::now() + RETRY_FOR;
        loop {
            match std::fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if is_stale(&path) {
                        let _ = std::fs::remove_file(&path);
                        continue;
                    }
                    if std::time::Instant::now() >= deadline {
                        return Err(Error::Conflict(format!(
                            "lock {} held by another writer",
                            path.display()
                        )));
                    }
                    std::thread::sleep(RETRY_EVERY);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn sidecar_path(target: &std::path::Path) -> PathBuf {
    let mut os = target.as_os_str().to_owned();
    os.push(".lock");
    PathBuf::from(os)
}

fn is_stale(path: &std::path::Path) -> bool {
    path.metadata()
        .and_then(|m| m.modified())
        .ok()
        .and_then(|mtime| mtime.elapsed().ok())
        .map(|age| age > STALE_AFTER)
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
