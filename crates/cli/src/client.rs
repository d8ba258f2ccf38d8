// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket client for talking to the parent daemon.

use std::path::PathBuf;

use hal_core::{Error, Result};
use hal_daemon::protocol::{encode, read_message, write_message, Request, Response};
use tokio::net::UnixStream;

pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    pub fn socket_path() -> Result<PathBuf> {
        Ok(hal_daemon::env::state_dir()?.join("daemon.sock"))
    }

    /// Connect to the running daemon, or fail with `NotFound`.
    pub async fn connect() -> Result<Self> {
        let socket = Self::socket_path()?;
        let stream = UnixStream::connect(&socket).await.map_err(|_| {
            Error::NotFound(format!("daemon is not running (no socket at {})", socket.display()))
        })?;
        Ok(Self { stream })
    }

    /// One request/response exchange. Wire errors are rehydrated into their
    /// original kind so exit codes survive the IPC boundary.
    pub async fn request(&mut self, request: Request) -> Result<Response> {
        write_message(&mut self.stream, &encode(&request)?).await?;
        let payload = read_message(&mut self.stream).await?;
        match hal_daemon::protocol::decode::<Response>(&payload)? {
            Response::Error { kind, message } => Err(kind.into_error(message)),
            response => Ok(response),
        }
    }

    /// Liveness probe; true iff the daemon answers a ping.
    pub async fn ping(&mut self) -> bool {
        matches!(self.request(Request::Ping).await, Ok(Response::Pong))
    }
}
