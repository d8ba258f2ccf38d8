// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Get daemon status
    Status,

    /// Create or reattach a session for a project directory
    Spawn {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        profile: Option<String>,
        /// Session name override (validated like a worker name)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Create without attaching
        #[serde(default)]
        detach: bool,
    },

    /// Resolve an existing session for attaching
    Attach { session: String },

    /// The attached client disconnected
    Detached { session: String },

    /// Forward keys to a session's pane
    Send { session: String, keys: String },

    /// Stop a session's worker
    Stop { session: String },

    /// Enumerate sessions and workers
    List,

    /// Pool Manager control
    Pool { command: PoolCommand },

    /// Request daemon shutdown
    Shutdown,
}

/// `hal pool …` subcommands carried over the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase", tag = "op")]
pub enum PoolCommand {
    Start,
    Stop,
    Status,
    /// Resize the warm set bounds for the running manager
    Scale { min: usize, max: usize },
    /// Stop and remove every pool-owned worker
    Cleanup,
}
