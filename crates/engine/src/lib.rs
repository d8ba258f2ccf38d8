// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hal-engine: the container-engine client.
//!
//! Every engine interaction is an [`EngineCall`] value handled by one
//! [`Engine::call`] implementation. Calls are rendered to argv arrays; no
//! shell is involved and the argument types are the validated wrappers from
//! `hal-core`, so an unvalidated string cannot reach the engine by
//! construction. The test double replaces the handler, nothing else.

mod call;
mod docker;
#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use call::{BindMount, EngineCall, RunSpec};
pub use docker::DockerEngine;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeEngine;

use async_trait::async_trait;
use hal_core::{Error, Result, WorkerName};

/// Output of a successful engine call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    pub stdout: String,
}

/// The capability set the orchestrator needs from a container engine.
///
/// The engine owns no state; it is a pure façade over the engine endpoint.
#[async_trait]
pub trait Engine: Send + Sync + 'static {
    async fn call(&self, call: EngineCall) -> Result<EngineOutput>;

    /// Cheap liveness probe of the engine endpoint.
    async fn probe(&self) -> Result<()>;
}

/// Whether a container with this name exists, via `inspect`.
///
/// An `EngineError` from inspect means "no such container"; transport-level
/// failures still propagate.
pub async fn container_exists<E: Engine + ?Sized>(engine: &E, name: &WorkerName) -> Result<bool> {
    let call = EngineCall::Inspect { container: name.clone(), format: None };
    match engine.call(call).await {
        Ok(_) => Ok(true),
        Err(Error::EngineError { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}
