// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! hal: the HAL-9000 command-line front-end.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod exit_error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hal", version, about = "Isolated assistant sessions in container sandboxes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Daemon management
    Daemon(commands::daemon::DaemonArgs),

    /// Create (or reattach) a session for a project directory
    Spawn {
        /// Project directory to mount at /workspace
        path: PathBuf,
        /// Image flavor: base, python, node or java
        #[arg(long)]
        profile: Option<String>,
        /// Session name override
        #[arg(long)]
        name: Option<String>,
        /// Create without attaching
        #[arg(long)]
        detach: bool,
    },

    /// Attach to an existing session
    Attach {
        /// Session id (from `hal list`)
        session: String,
    },

    /// Stop a session's worker (the session itself survives)
    Stop {
        /// Session id (from `hal list`)
        session: String,
    },

    /// Enumerate sessions and workers
    List,

    /// Warm pool control
    Pool(commands::pool::PoolArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Daemon(args) => commands::daemon::run(args).await,
        Command::Spawn { path, profile, name, detach } => {
            commands::spawn::run(path, profile, name, detach).await
        }
        Command::Attach { session } => commands::attach::run(session).await,
        Command::Stop { session } => commands::stop::run(session).await,
        Command::List => commands::list::run().await,
        Command::Pool(args) => commands::pool::run(args).await,
    };
    match result {
        Ok(code) => code,
        Err(e) => exit_error::fail(&e),
    }
}
