// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hal attach` - Attach to an existing session

use std::process::ExitCode;

use hal_core::{Error, Result};
use hal_daemon::protocol::{Request, Response};

use crate::client::DaemonClient;
use crate::commands::{attach_tty, OK};

pub async fn run(session: String) -> Result<ExitCode> {
    let mut client = DaemonClient::connect().await?;
    let attach = match client.request(Request::Attach { session: session.clone() }).await? {
        Response::Attach { attach } => attach,
        other => return Err(Error::Internal(format!("unexpected response: {:?}", other))),
    };

    attach_tty(&attach)?;
    client.request(Request::Detached { session }).await?;
    Ok(OK)
}
