// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the daemon socket.
//!
//! Accepts connections and handles each in a spawned task; requests are
//! dispatched against the shared daemon context. Errors cross the wire as
//! `Response::Error` with their kind so the CLI reproduces exit codes.

use std::sync::Arc;
use std::time::Instant;

use hal_core::{Clock, Error, Result};
use hal_engine::Engine;
use hal_storage::StateStore;
use parking_lot::Mutex;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::coordinator::Coordinator;
use crate::env::PROTOCOL_VERSION;
use crate::pool::{cleanup_warm, PoolConfig, PoolManager};
use crate::protocol::{
    read_request, write_response, PoolCommand, PoolCounts, Request, Response, StatusInfo,
};
use crate::services::VectorIndex;
use crate::sessions::SessionApi;
use crate::spawner::WorkerSpawner;

/// A running Pool Manager task.
pub struct PoolHandle {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl PoolHandle {
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Shared daemon context for all request handlers.
pub struct ListenCtx<E, C> {
    pub engine: Arc<E>,
    pub store: StateStore,
    pub api: SessionApi<E, C>,
    pub coordinator: Arc<Coordinator<E, C>>,
    pub spawner: Arc<WorkerSpawner<E, C>>,
    pub vector_index: Arc<VectorIndex>,
    pub pool_config: Mutex<PoolConfig>,
    pub pool: tokio::sync::Mutex<Option<PoolHandle>>,
    pub clock: C,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
    pub stop_grace: std::time::Duration,
}

impl<E: Engine, C: Clock> ListenCtx<E, C> {
    /// Launch the Pool Manager unless one is already running.
    pub async fn start_pool(self: &Arc<Self>) -> bool {
        let mut slot = self.pool.lock().await;
        if slot.is_some() {
            return false;
        }
        let cancel = CancellationToken::new();
        let manager = PoolManager::new(
            Arc::clone(&self.engine),
            self.store.clone(),
            Arc::clone(&self.spawner),
            self.pool_config.lock().clone(),
            self.clock.clone(),
        );
        let task = tokio::spawn(manager.run(cancel.clone()));
        *slot = Some(PoolHandle { cancel, task });
        true
    }

    pub async fn stop_pool(self: &Arc<Self>) -> bool {
        let handle = self.pool.lock().await.take();
        match handle {
            Some(handle) => {
                handle.stop().await;
                true
            }
            None => false,
        }
    }

    fn pool_counts(&self) -> Result<PoolCounts> {
        let mut counts = PoolCounts {
            min: self.pool_config.lock().min_warm,
            max: self.pool_config.lock().max_warm,
            manager_running: false,
            manager_pid: self.store.read_pool_pid(),
            ..PoolCounts::default()
        };
        for worker in self.store.list_workers()? {
            match worker.state {
                hal_core::WorkerState::Warm => counts.warm += 1,
                hal_core::WorkerState::Busy | hal_core::WorkerState::Claimed => counts.busy += 1,
                hal_core::WorkerState::Idle => counts.idle += 1,
                hal_core::WorkerState::Reaped => {}
            }
        }
        counts.manager_running = counts.manager_pid.is_some();
        Ok(counts)
    }
}

/// Accept loop. Stops when the shutdown notify fires.
pub async fn run<E: Engine, C: Clock>(listener: UnixListener, ctx: Arc<ListenCtx<E, C>>) {
    let shutdown = Arc::clone(&ctx.shutdown);
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            debug!(error = %e, "connection closed with error");
                        }
                    });
                }
                Err(e) => error!("accept error: {}", e),
            }
        }
    }
    info!("listener stopped");
}

async fn handle_connection<E: Engine, C: Clock>(
    stream: UnixStream,
    ctx: &Arc<ListenCtx<E, C>>,
) -> Result<()> {
    let (mut reader, mut writer) = stream.into_split();
    while let Some(request) = read_request(&mut reader).await? {
        let shutdown = matches!(request, Request::Shutdown);
        let response = dispatch(ctx, request).await;
        write_response(&mut writer, &response).await?;
        if shutdown {
            ctx.shutdown.notify_waiters();
            break;
        }
    }
    Ok(())
}

async fn dispatch<E: Engine, C: Clock>(ctx: &Arc<ListenCtx<E, C>>, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                debug!(client = %version, daemon = PROTOCOL_VERSION, "version skew");
            }
            Response::Hello { version: PROTOCOL_VERSION.to_string() }
        }
        Request::Status => match ctx.pool_counts() {
            Ok(pool) => Response::Status(StatusInfo {
                running: true,
                uptime_secs: ctx.start_time.elapsed().as_secs(),
                vector_index_health: ctx.vector_index.health(),
                pool,
            }),
            Err(e) => Response::error(&e),
        },
        Request::Spawn { path, profile, name, detach: _ } => {
            match ctx.api.spawn(&path, profile.as_deref(), name.as_deref()).await {
                Ok(info) => Response::Spawned(info),
                Err(e) => Response::error(&e),
            }
        }
        Request::Attach { session } => match ctx.api.attach(&session).await {
            Ok(attach) => Response::Attach { attach },
            Err(e) => Response::error(&e),
        },
        Request::Detached { session } => match ctx.api.detached(&session).await {
            Ok(()) => Response::Ok,
            Err(e) => Response::error(&e),
        },
        Request::Send { session, keys } => match ctx.api.send(&session, &keys).await {
            Ok(()) => Response::Ok,
            Err(e) => Response::error(&e),
        },
        Request::Stop { session } => match ctx.api.stop(&session).await {
            Ok(()) => Response::Ok,
            Err(e) => Response::error(&e),
        },
        Request::List => {
            let sessions = match ctx.api.list_sessions() {
                Ok(sessions) => sessions,
                Err(e) => return Response::error(&e),
            };
            match ctx.coordinator.list_workers().await {
                Ok(workers) => Response::Listing { sessions, workers },
                Err(e) => Response::error(&e),
            }
        }
        Request::Pool { command } => pool_command(ctx, command).await,
        Request::Shutdown => Response::ShuttingDown,
    }
}

async fn pool_command<E: Engine, C: Clock>(
    ctx: &Arc<ListenCtx<E, C>>,
    command: PoolCommand,
) -> Response {
    match command {
        PoolCommand::Start => {
            if ctx.start_pool().await {
                Response::Ok
            } else {
                Response::error(&Error::Conflict("pool manager already running".to_string()))
            }
        }
        PoolCommand::Stop => {
            if ctx.stop_pool().await {
                Response::Ok
            } else {
                Response::error(&Error::NotFound("pool manager not running".to_string()))
            }
        }
        PoolCommand::Status => match ctx.pool_counts() {
            Ok(counts) => Response::Pool(counts),
            Err(e) => Response::error(&e),
        },
        PoolCommand::Scale { min, max } => {
            if min > max {
                return Response::error(&Error::InvalidArgument(format!(
                    "pool floor {} exceeds ceiling {}",
                    min, max
                )));
            }
            {
                let mut config = ctx.pool_config.lock();
                config.min_warm = min;
                config.max_warm = max;
            }
            // A running manager picks the bounds up on restart.
            if ctx.stop_pool().await {
                ctx.start_pool().await;
            }
            Response::Ok
        }
        PoolCommand::Cleanup => {
            match cleanup_warm(&*ctx.engine, &ctx.store, ctx.stop_grace).await {
                Ok(removed) => {
                    if removed > 0 {
                        warn!(removed, "pool cleanup removed warm workers");
                    }
                    Response::Ok
                }
                Err(e) => Response::error(&e),
            }
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
