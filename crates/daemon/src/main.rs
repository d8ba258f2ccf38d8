// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! hald: the HAL-9000 parent daemon.

use std::process::ExitCode;
use std::sync::Arc;

use hal_core::ErrorKind;
use hal_daemon::bootstrap;
use hal_daemon::config::Config;
use hal_daemon::pool::cleanup_warm;
use hal_engine::DockerEngine;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("hald: {}", e);
            return ExitCode::from(1);
        }
    };

    // Logs live under the state dir; stdout stays quiet for daemonization.
    if let Err(e) = std::fs::create_dir_all(config.state_dir.join("logs")) {
        eprintln!("hald: cannot create log directory: {}", e);
        return ExitCode::from(1);
    }
    let appender = tracing_appender::rolling::daily(config.state_dir.join("logs"), "hald.log");
    let (writer, _log_guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let engine =
        Arc::new(DockerEngine::new(config.engine_socket.clone(), config.engine_call_timeout));

    let socket_path = config.socket_path.clone();
    let stop_grace = config.stop_grace;
    let startup = match bootstrap::startup(config, engine).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "bootstrap failed");
            eprintln!("hald: {}", e);
            return match e.kind() {
                ErrorKind::Conflict => ExitCode::from(2),
                _ => ExitCode::from(1),
            };
        }
    };
    let bootstrap::StartupResult { ctx, listener, lock_file, cancel } = startup;

    // First signal: graceful shutdown. Second: immediate exit.
    let shutdown = Arc::clone(&ctx.shutdown);
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "cannot install signal handler");
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "cannot install signal handler");
                return;
            }
        };
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
        info!("shutdown signal received");
        shutdown.notify_waiters();
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
        warn!("second signal; exiting immediately");
        std::process::exit(1);
    });

    hal_daemon::listener::run(listener, Arc::clone(&ctx)).await;

    // Graceful teardown: stop scheduling, retire the warm pool, leave
    // claimed workers running (interactive sessions survive a restart).
    cancel.cancel();
    ctx.stop_pool().await;
    if let Err(e) = cleanup_warm(&*ctx.engine, &ctx.store, stop_grace).await {
        warn!(error = %e, "warm pool cleanup on shutdown failed");
    }
    ctx.vector_index.stop().await;
    let _ = std::fs::remove_file(&socket_path);
    drop(lock_file);
    info!("daemon stopped");
    ExitCode::SUCCESS
}
