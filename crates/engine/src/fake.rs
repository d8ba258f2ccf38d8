// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording engine double for tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hal_core::{Error, Result};
use parking_lot::Mutex;

use crate::{Engine, EngineCall, EngineOutput};

/// In-memory engine that records every call and simulates a minimal
/// container table (run/rename/rm/inspect semantics).
#[derive(Clone, Default)]
pub struct FakeEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    containers: Arc<Mutex<BTreeSet<String>>>,
    fail_ops: Arc<Mutex<HashMap<&'static str, String>>>,
    unavailable: Arc<AtomicBool>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call recorded so far, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, op: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.op() == op).count()
    }

    /// Names of containers the fake believes exist.
    pub fn containers(&self) -> Vec<String> {
        self.containers.lock().iter().cloned().collect()
    }

    /// Pre-seed a container, as if created out of band.
    pub fn add_container(&self, name: &str) {
        self.containers.lock().insert(name.to_string());
    }

    /// Drop a container behind the orchestrator's back.
    pub fn remove_container(&self, name: &str) {
        self.containers.lock().remove(name);
    }

    /// All subsequent calls report a missing engine socket.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make every subsequent `op` call fail with an engine error.
    pub fn fail_op(&self, op: &'static str, message: &str) {
        self.fail_ops.lock().insert(op, message.to_string());
    }

    pub fn clear_failures(&self) {
        self.fail_ops.lock().clear();
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn call(&self, call: EngineCall) -> Result<EngineOutput> {
        self.calls.lock().push(call.clone());

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::EngineUnavailable("engine socket is not mounted".to_string()));
        }
        if let Some(message) = self.fail_ops.lock().get(call.op()) {
            return Err(Error::engine(call.op(), message.clone()));
        }

        let mut containers = self.containers.lock();
        match &call {
            EngineCall::Run(spec) => {
                let name = spec.name.as_str();
                if !containers.insert(name.to_string()) {
                    return Err(Error::engine(
                        "run",
                        format!("container name {:?} is already in use", name),
                    ));
                }
                // Engine-assigned id: deterministic from the name.
                Ok(EngineOutput { stdout: format!("id-{}", name) })
            }
            EngineCall::Rename { container, new_name } => {
                if !containers.remove(container.as_str()) {
                    return Err(Error::engine(
                        "rename",
                        format!("no such container: {}", container),
                    ));
                }
                containers.insert(new_name.as_str().to_string());
                Ok(EngineOutput::default())
            }
            EngineCall::Inspect { container, format } => {
                if containers.contains(container.as_str()) {
                    // With a format template, answer like `{{.Id}}` would.
                    let stdout = if format.is_some() {
                        format!("id-{}", container.as_str())
                    } else {
                        "[]".to_string()
                    };
                    Ok(EngineOutput { stdout })
                } else {
                    Err(Error::engine("inspect", format!("no such container: {}", container)))
                }
            }
            EngineCall::Stop { container, .. } => {
                if containers.contains(container.as_str()) {
                    Ok(EngineOutput::default())
                } else {
                    Err(Error::engine("stop", format!("no such container: {}", container)))
                }
            }
            EngineCall::Rm { container, force } => {
                if containers.remove(container.as_str()) || *force {
                    Ok(EngineOutput::default())
                } else {
                    Err(Error::engine("rm", format!("no such container: {}", container)))
                }
            }
            EngineCall::Exec { .. }
            | EngineCall::Pull { .. }
            | EngineCall::VolumeCreate { .. }
            | EngineCall::Stats { .. } => Ok(EngineOutput::default()),
        }
    }

    async fn probe(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(Error::EngineUnavailable("engine socket is not mounted".to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
