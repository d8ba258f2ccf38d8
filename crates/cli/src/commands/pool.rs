// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hal pool` - Warm pool control

use std::process::ExitCode;

use clap::{Args, Subcommand};
use hal_core::{Error, Result};
use hal_daemon::protocol::{PoolCommand, Request, Response};

use crate::client::DaemonClient;
use crate::commands::OK;

#[derive(Args)]
pub struct PoolArgs {
    #[command(subcommand)]
    pub command: PoolSubcommand,
}

#[derive(Subcommand)]
pub enum PoolSubcommand {
    /// Start the pool manager
    Start,
    /// Stop the pool manager (workers keep running)
    Stop,
    /// Show pool counters
    Status,
    /// Set the warm floor to N (ceiling rises to N if below)
    Scale { n: usize },
    /// Stop and remove all warm workers
    Cleanup,
}

pub async fn run(args: PoolArgs) -> Result<ExitCode> {
    let mut client = DaemonClient::connect().await?;
    match args.command {
        PoolSubcommand::Start => {
            client.request(Request::Pool { command: PoolCommand::Start }).await?;
            println!("pool manager started");
        }
        PoolSubcommand::Stop => {
            client.request(Request::Pool { command: PoolCommand::Stop }).await?;
            println!("pool manager stopped");
        }
        PoolSubcommand::Status => {
            let counts = match client.request(Request::Pool { command: PoolCommand::Status }).await?
            {
                Response::Pool(counts) => counts,
                other => return Err(Error::Internal(format!("unexpected response: {:?}", other))),
            };
            println!("warm     {}", counts.warm);
            println!("busy     {}", counts.busy);
            println!("idle     {}", counts.idle);
            println!("bounds   [{}, {}]", counts.min, counts.max);
            match counts.manager_pid {
                Some(pid) => println!("manager  running (pid {})", pid),
                None => println!("manager  stopped"),
            }
        }
        PoolSubcommand::Scale { n } => {
            // Raise the ceiling along with the floor when needed.
            let current = match client
                .request(Request::Pool { command: PoolCommand::Status })
                .await?
            {
                Response::Pool(counts) => counts,
                other => return Err(Error::Internal(format!("unexpected response: {:?}", other))),
            };
            let max = current.max.max(n);
            client.request(Request::Pool { command: PoolCommand::Scale { min: n, max } }).await?;
            println!("pool scaled to [{}, {}]", n, max);
        }
        PoolSubcommand::Cleanup => {
            client.request(Request::Pool { command: PoolCommand::Cleanup }).await?;
            println!("warm workers removed");
        }
    }
    Ok(OK)
}
