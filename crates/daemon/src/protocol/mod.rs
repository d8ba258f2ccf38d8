// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol between the CLI and the parent daemon.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

mod request;
mod response;
mod wire;

pub use request::{PoolCommand, Request};
pub use response::{
    AttachInfo, PoolCounts, Response, SessionEntry, SpawnedInfo, StatusInfo, WorkerEntry,
};
pub use wire::{decode, encode, read_message, write_message, read_request, write_response};
