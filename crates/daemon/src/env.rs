// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use hal_core::{Error, Result};

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve state directory: `HAL9000_HOME` > `~/.hal9000`.
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("HAL9000_HOME") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".hal9000"))
        .ok_or_else(|| Error::Internal("cannot determine home directory".to_string()))
}

/// Default worker image override. Falls back to the first allowlist entry.
pub fn worker_image() -> Option<String> {
    std::env::var("WORKER_IMAGE").ok().filter(|s| !s.is_empty())
}

/// Vector-index bind address.
pub fn chromadb_host() -> String {
    std::env::var("CHROMADB_HOST").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "0.0.0.0".to_string())
}

/// Vector-index port.
pub fn chromadb_port() -> u16 {
    std::env::var("CHROMADB_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8000)
}

/// Vector-index data directory.
pub fn chromadb_data_dir() -> PathBuf {
    std::env::var("CHROMADB_DATA_DIR")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/data/chromadb"))
}

/// Skip the worker-image pull at bootstrap.
pub fn skip_image_pull() -> bool {
    flag("SKIP_IMAGE_PULL")
}

/// Pull the worker image in the background without blocking bootstrap.
pub fn lazy_image_pull() -> bool {
    flag("LAZY_IMAGE_PULL")
}

/// Run the Pool Manager as a background service.
pub fn pool_manager_enabled() -> bool {
    flag("ENABLE_POOL_MANAGER")
}

/// Warm pool floor.
pub fn min_warm_workers() -> usize {
    std::env::var("MIN_WARM_WORKERS").ok().and_then(|s| s.parse().ok()).unwrap_or(2)
}

/// Warm pool ceiling.
pub fn max_warm_workers() -> usize {
    std::env::var("MAX_WARM_WORKERS").ok().and_then(|s| s.parse().ok()).unwrap_or(5)
}

/// Seconds before an idle worker is retired.
pub fn idle_timeout() -> Duration {
    Duration::from_secs(
        std::env::var("IDLE_TIMEOUT").ok().and_then(|s| s.parse().ok()).unwrap_or(300),
    )
}

/// Pool Manager tick period.
pub fn check_interval() -> Duration {
    Duration::from_secs(
        std::env::var("CHECK_INTERVAL").ok().and_then(|s| s.parse().ok()).unwrap_or(30),
    )
}

/// Worker resource limits: `WORKER_MEMORY`, `WORKER_CPUS`, `WORKER_PIDS_LIMIT`.
pub fn worker_limits() -> Result<hal_core::ResourceLimits> {
    let memory = std::env::var("WORKER_MEMORY").unwrap_or_else(|_| "4g".to_string());
    let cpus = std::env::var("WORKER_CPUS").unwrap_or_else(|_| "2".to_string());
    let pids = std::env::var("WORKER_PIDS_LIMIT").unwrap_or_else(|_| "100".to_string());
    hal_core::ResourceLimits::from_parts(&memory, &cpus, &pids)
}

/// Per-call engine timeout (default 30s, via `HAL9000_ENGINE_TIMEOUT_MS`).
pub fn engine_call_timeout() -> Duration {
    millis("HAL9000_ENGINE_TIMEOUT_MS", 30_000)
}

/// Vector-index readiness deadline (default 30s).
pub fn readiness_deadline() -> Duration {
    millis("HAL9000_READY_TIMEOUT_MS", 30_000)
}

/// Grace period between stop and rm (default 10s).
pub fn stop_grace() -> Duration {
    millis("HAL9000_STOP_GRACE_MS", 10_000)
}

/// Container-engine socket path.
pub fn engine_socket() -> PathBuf {
    std::env::var("HAL9000_ENGINE_SOCKET")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/var/run/docker.sock"))
}

/// Name of the parent container whose network namespace workers join.
pub fn parent_container() -> String {
    std::env::var("HAL9000_PARENT_NAME")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "hal9000-parent".to_string())
}

fn flag(name: &str) -> bool {
    matches!(std::env::var(name).as_deref(), Ok("true") | Ok("1"))
}

fn millis(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(
        std::env::var(name).ok().and_then(|s| s.parse().ok()).unwrap_or(default_ms),
    )
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
