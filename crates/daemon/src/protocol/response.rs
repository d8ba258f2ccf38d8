// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use hal_core::{ErrorKind, Health, Profile, WorkerState};
use serde::{Deserialize, Serialize};

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon is shutting down
    ShuttingDown,

    /// Daemon status
    Status(StatusInfo),

    /// Session created or reattached
    Spawned(SpawnedInfo),

    /// Attach target resolved
    Attach { attach: AttachInfo },

    /// Sessions and workers
    Listing { sessions: Vec<SessionEntry>, workers: Vec<WorkerEntry> },

    /// Pool counters
    Pool(PoolCounts),

    /// Error response; `kind` lets the CLI reproduce exit codes
    Error { kind: ErrorKind, message: String },
}

impl Response {
    pub fn error(e: &hal_core::Error) -> Self {
        Response::Error { kind: e.kind(), message: e.to_string() }
    }
}

/// What the CLI needs to stream a pane to its TTY.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachInfo {
    pub tmux_socket: PathBuf,
    pub tmux_session: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpawnedInfo {
    pub session: SessionEntry,
    pub attach: AttachInfo,
    /// Claimed from the warm pool rather than cold-spawned
    pub from_pool: bool,
    /// False when an existing live session was reattached
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEntry {
    pub id: String,
    pub project_path: PathBuf,
    pub profile: Profile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    pub created_at_ms: u64,
    pub last_attached_at_ms: u64,
}

impl From<&hal_core::Session> for SessionEntry {
    fn from(s: &hal_core::Session) -> Self {
        Self {
            id: s.id.clone(),
            project_path: s.project_path.clone(),
            profile: s.profile,
            container_id: s.container_id.clone(),
            created_at_ms: s.created_at_ms,
            last_attached_at_ms: s.last_attached_at_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerEntry {
    pub name: String,
    pub state: WorkerState,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Container currently exists according to the engine
    pub alive: bool,
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusInfo {
    pub running: bool,
    pub uptime_secs: u64,
    pub vector_index_health: Health,
    pub pool: PoolCounts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PoolCounts {
    pub warm: usize,
    pub busy: usize,
    pub idle: usize,
    pub min: usize,
    pub max: usize,
    pub manager_running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_pid: Option<u32>,
}
