// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hal stop` - Stop a session's worker

use std::process::ExitCode;

use hal_core::Result;
use hal_daemon::protocol::Request;

use crate::client::DaemonClient;
use crate::commands::OK;

pub async fn run(session: String) -> Result<ExitCode> {
    let mut client = DaemonClient::connect().await?;
    client.request(Request::Stop { session: session.clone() }).await?;
    println!("{} stopped", session);
    Ok(OK)
}
