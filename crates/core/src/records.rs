// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted session and worker records.
//!
//! Records are plain JSON objects on disk. Fields written by newer versions
//! are captured in `extra` and survive read-modify-write untouched.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::allowlist::ImageRef;
use crate::limits::ResourceLimits;
use crate::validate::Profile;

/// One project-path-to-worker mapping for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Derived name, stable across restarts for the same canonical path.
    pub id: String,
    /// Absolute project directory on the host.
    pub project_path: PathBuf,
    pub profile: Profile,
    /// Present iff a worker is currently bound to this session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    pub created_at_ms: u64,
    #[serde(default)]
    pub last_attached_at_ms: u64,
    #[serde(default)]
    pub resource_limits: ResourceLimits,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        project_path: PathBuf,
        profile: Profile,
        limits: ResourceLimits,
        now_ms: u64,
    ) -> Self {
        Self {
            id: id.into(),
            project_path,
            profile,
            container_id: None,
            created_at_ms: now_ms,
            last_attached_at_ms: 0,
            resource_limits: limits,
            extra: Map::new(),
        }
    }
}

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Warm,
    Claimed,
    Busy,
    Idle,
    Reaped,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Warm => "warm",
            WorkerState::Claimed => "claimed",
            WorkerState::Busy => "busy",
            WorkerState::Idle => "idle",
            WorkerState::Reaped => "reaped",
        }
    }
}

/// One container holding the multiplexer session that hosts the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub name: String,
    pub state: WorkerState,
    pub image_ref: ImageRef,
    /// Always `container:<parent>`; workers share the parent's namespace.
    pub network_mode: String,
    /// On a shared volume so the parent can drive the multiplexer directly.
    pub tmux_socket_path: PathBuf,
    /// Host directory the worker sees at `/workspace`: the project itself
    /// for cold spawns, a pool-owned directory for warm workers (the claim
    /// delivers the project into it, since a rename cannot add mounts).
    #[serde(default)]
    pub workspace_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub created_at_ms: u64,
    #[serde(default)]
    pub last_attached_at_ms: u64,
    #[serde(default)]
    pub resource_limits: ResourceLimits,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shared-service probe state: `starting → ok`, `ok → failed` after
/// consecutive heartbeat misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Starting,
    Ok,
    Failed,
}

impl Health {
    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Starting => "starting",
            Health::Ok => "ok",
            Health::Failed => "failed",
        }
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
