// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hal spawn` - Create or reattach a session

use std::path::PathBuf;
use std::process::ExitCode;

use hal_core::{Error, Result};
use hal_daemon::protocol::{Request, Response};

use crate::client::DaemonClient;
use crate::commands::{attach_tty, OK};

pub async fn run(
    path: PathBuf,
    profile: Option<String>,
    name: Option<String>,
    detach: bool,
) -> Result<ExitCode> {
    let mut client = DaemonClient::connect().await?;
    let response = client.request(Request::Spawn { path, profile, name, detach }).await?;
    let info = match response {
        Response::Spawned(info) => info,
        other => return Err(Error::Internal(format!("unexpected response: {:?}", other))),
    };

    if info.created {
        let source = if info.from_pool { "warm pool" } else { "cold spawn" };
        println!("{} ({})", info.session.id, source);
    } else {
        println!("{} (existing)", info.session.id);
    }

    if detach {
        return Ok(OK);
    }

    attach_tty(&info.attach)?;
    // The pane stream ended; tell the daemon so the worker can go idle.
    client.request(Request::Detached { session: info.session.id }).await?;
    Ok(OK)
}
