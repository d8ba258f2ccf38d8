// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hal list` - Enumerate sessions and workers

use std::process::ExitCode;

use hal_core::{Error, Result};
use hal_daemon::protocol::{Request, Response};

use crate::client::DaemonClient;
use crate::commands::OK;

pub async fn run() -> Result<ExitCode> {
    let mut client = DaemonClient::connect().await?;
    let (sessions, workers) = match client.request(Request::List).await? {
        Response::Listing { sessions, workers } => (sessions, workers),
        other => return Err(Error::Internal(format!("unexpected response: {:?}", other))),
    };

    if sessions.is_empty() && workers.is_empty() {
        println!("no sessions");
        return Ok(OK);
    }

    if !sessions.is_empty() {
        println!("{:<40} {:<8} {}", "SESSION", "PROFILE", "PROJECT");
        for session in &sessions {
            println!(
                "{:<40} {:<8} {}",
                session.id,
                session.profile.as_str(),
                session.project_path.display()
            );
        }
    }

    if !workers.is_empty() {
        println!();
        println!("{:<40} {:<8} {:<6} {}", "WORKER", "STATE", "ALIVE", "SESSION");
        for worker in &workers {
            println!(
                "{:<40} {:<8} {:<6} {}",
                worker.name,
                worker.state.as_str(),
                if worker.alive { "yes" } else { "no" },
                worker.session_id.as_deref().unwrap_or("-"),
            );
        }
    }
    Ok(OK)
}
