// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker resource limits, enforced by the engine rather than the
//! orchestrator.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Memory/cpu/pids caps applied to a worker container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Engine memory string, e.g. `4g` or `512m`.
    pub memory: String,
    pub cpus: f64,
    pub pids: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self { memory: "4g".to_string(), cpus: 2.0, pids: 100 }
    }
}

impl ResourceLimits {
    /// Parse limits from their textual (environment) form.
    pub fn from_parts(memory: &str, cpus: &str, pids: &str) -> Result<Self> {
        validate_memory(memory)?;
        let cpus: f64 = cpus
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("cpu limit {:?} is not a number", cpus)))?;
        if !(cpus > 0.0) {
            return Err(Error::InvalidArgument(format!("cpu limit {} must be positive", cpus)));
        }
        let pids: u32 = pids.parse().map_err(|_| {
            Error::InvalidArgument(format!("pids limit {:?} is not an integer", pids))
        })?;
        if pids == 0 {
            return Err(Error::InvalidArgument("pids limit must be positive".to_string()));
        }
        Ok(Self { memory: memory.to_string(), cpus, pids })
    }
}

/// Accepts the engine's memory syntax: digits with an optional b/k/m/g suffix.
fn validate_memory(s: &str) -> Result<()> {
    let digits = s.strip_suffix(['b', 'k', 'm', 'g']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidArgument(format!(
            "memory limit {:?} (expected digits with optional b/k/m/g suffix)",
            s
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "limits_tests.rs"]
mod tests;
