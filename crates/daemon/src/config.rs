// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration assembled once at startup.

use std::path::PathBuf;
use std::time::Duration;

use hal_core::{ImageAllowlist, ResourceLimits, Result};

use crate::env;
use crate::pool::PoolConfig;
use crate::services::VectorIndexConfig;

/// Everything the parent needs to run, resolved from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    /// Shared-volume directory holding one multiplexer socket per worker.
    pub tmux_dir: PathBuf,
    pub engine_socket: PathBuf,
    pub parent_container: String,
    /// Resolved at bootstrap: `WORKER_IMAGE` or the first allowlist entry.
    pub worker_image: String,
    pub allowlist: ImageAllowlist,
    pub limits: ResourceLimits,
    pub pool: PoolConfig,
    pub vector_index: VectorIndexConfig,
    pub engine_call_timeout: Duration,
    pub readiness_deadline: Duration,
    pub stop_grace: Duration,
    pub skip_image_pull: bool,
    pub lazy_image_pull: bool,
    pub pool_manager_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let state_dir = env::state_dir()?;
        let allowlist = ImageAllowlist::load(&state_dir.join("allowlist"))?;
        let worker_image =
            env::worker_image().unwrap_or_else(|| allowlist.default_reference().to_string());
        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.lock"),
            tmux_dir: state_dir.join("tmux"),
            engine_socket: env::engine_socket(),
            parent_container: env::parent_container(),
            worker_image,
            allowlist,
            limits: env::worker_limits()?,
            pool: PoolConfig {
                min_warm: env::min_warm_workers(),
                max_warm: env::max_warm_workers(),
                idle_timeout: env::idle_timeout(),
                check_interval: env::check_interval(),
                stop_grace: env::stop_grace(),
            },
            vector_index: VectorIndexConfig {
                host: env::chromadb_host(),
                port: env::chromadb_port(),
                data_dir: env::chromadb_data_dir(),
            },
            engine_call_timeout: env::engine_call_timeout(),
            readiness_deadline: env::readiness_deadline(),
            stop_grace: env::stop_grace(),
            skip_image_pull: env::skip_image_pull(),
            lazy_image_pull: env::lazy_image_pull(),
            pool_manager_enabled: env::pool_manager_enabled(),
            state_dir,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
