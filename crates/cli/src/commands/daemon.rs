// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hal daemon` - Daemon management commands

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Args, Subcommand};
use hal_core::{Error, Result};
use hal_daemon::protocol::{Request, Response};

use crate::client::DaemonClient;
use crate::commands::OK;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (background unless --foreground)
    Start {
        /// Run in foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon gracefully
    Stop,
    /// Check daemon status
    Status,
    /// Stop and restart the daemon
    Restart,
    /// View recent daemon log lines
    Logs {
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "200")]
        limit: usize,
    },
}

pub async fn run(args: DaemonArgs) -> Result<ExitCode> {
    match args.command {
        DaemonCommand::Start { foreground } => start(foreground).await,
        DaemonCommand::Stop => stop().await,
        DaemonCommand::Status => status().await,
        DaemonCommand::Restart => {
            stop().await?;
            start(false).await
        }
        DaemonCommand::Logs { limit } => logs(limit),
    }
}

async fn start(foreground: bool) -> Result<ExitCode> {
    if let Ok(mut client) = DaemonClient::connect().await {
        if client.ping().await {
            // Bootstrap is idempotent against a running parent.
            return Err(Error::Conflict("daemon already running".to_string()));
        }
    }

    let hald = find_hald_binary()?;
    if foreground {
        let status = std::process::Command::new(&hald)
            .status()
            .map_err(|e| Error::Internal(format!("failed to run hald: {}", e)))?;
        return Ok(ExitCode::from(status.code().unwrap_or(1) as u8));
    }

    let mut child = std::process::Command::new(&hald)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        // Bootstrap failures print one line; let the user see it.
        .stderr(std::process::Stdio::inherit())
        .spawn()
        .map_err(|e| Error::Internal(format!("failed to spawn hald: {}", e)))?;

    // Wait for the socket to answer, or for the child to give up.
    let deadline = Instant::now() + Duration::from_secs(60);
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| Error::Internal(format!("waiting for hald: {}", e)))?
        {
            let code = status.code().unwrap_or(1) as u8;
            return match code {
                2 => Err(Error::Conflict("daemon already running".to_string())),
                _ => Err(Error::Internal("daemon failed to start".to_string())),
            };
        }
        if let Ok(mut client) = DaemonClient::connect().await {
            if client.ping().await {
                println!("Daemon started");
                return Ok(OK);
            }
        }
        if Instant::now() >= deadline {
            return Err(Error::Timeout("daemon did not become ready".to_string()));
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

async fn stop() -> Result<ExitCode> {
    match DaemonClient::connect().await {
        Ok(mut client) => {
            match client.request(Request::Shutdown).await? {
                Response::ShuttingDown | Response::Ok => println!("Daemon stopped"),
                other => {
                    return Err(Error::Internal(format!("unexpected response: {:?}", other)))
                }
            }
            Ok(OK)
        }
        Err(_) => {
            println!("Daemon not running");
            Ok(OK)
        }
    }
}

async fn status() -> Result<ExitCode> {
    let mut client = match DaemonClient::connect().await {
        Ok(client) => client,
        Err(_) => {
            println!("not running");
            return Ok(ExitCode::from(1));
        }
    };
    match client.request(Request::Status).await? {
        Response::Status(status) => {
            println!("running          yes (uptime {}s)", status.uptime_secs);
            println!("vector-index     {}", status.vector_index_health.as_str());
            println!(
                "pool             warm={} busy={} idle={} (min={} max={} manager={})",
                status.pool.warm,
                status.pool.busy,
                status.pool.idle,
                status.pool.min,
                status.pool.max,
                if status.pool.manager_running { "running" } else { "stopped" },
            );
            Ok(OK)
        }
        other => Err(Error::Internal(format!("unexpected response: {:?}", other))),
    }
}

fn logs(limit: usize) -> Result<ExitCode> {
    let logs_dir = hal_daemon::env::state_dir()?.join("logs");
    let mut files: Vec<_> = std::fs::read_dir(&logs_dir)
        .map_err(|_| Error::NotFound(format!("no logs at {}", logs_dir.display())))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with("hald.log"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    let Some(latest) = files.last() else {
        return Err(Error::NotFound("no daemon log file yet".to_string()));
    };

    let contents = std::fs::read_to_string(latest)?;
    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(limit);
    for line in &lines[start..] {
        println!("{}", line);
    }
    Ok(OK)
}

/// The daemon binary ships next to the CLI.
fn find_hald_binary() -> Result<std::path::PathBuf> {
    let current = std::env::current_exe()
        .map_err(|e| Error::Internal(format!("cannot locate own binary: {}", e)))?;
    let sibling = current.with_file_name("hald");
    if sibling.exists() {
        return Ok(sibling);
    }
    // Fall back to PATH resolution.
    Ok(std::path::PathBuf::from("hald"))
}
