// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator error type.
//!
//! One enum for every failure the orchestrator surfaces. Leaf components
//! never recover; they report up with `?`. User-visible rendering is the
//! one-line `Display` form; anything longer belongs in the log file.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum Error {
    /// Validator rejected input. Not retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Image not in the allowlist, or path under a blocked root. Not retried.
    #[error("denied by policy: {0}")]
    PolicyDenied(String),

    /// Engine socket missing or unresponsive.
    #[error("container engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Engine returned a non-zero status; message surfaced verbatim with the
    /// failed operation name.
    #[error("engine {op} failed: {message}")]
    EngineError { op: String, message: String },

    /// Session or worker not in the state store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Name collision or claim race loser.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Exceeded an engine call timeout or a readiness deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Unexpected condition. Details go to the log file only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn engine(op: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EngineError { op: op.into(), message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::PolicyDenied(_) => ErrorKind::PolicyDenied,
            Error::EngineUnavailable(_) => ErrorKind::EngineUnavailable,
            Error::EngineError { .. } => ErrorKind::EngineError,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(format!("state encoding: {}", e))
    }
}

/// Discriminant-only view of [`Error`], used across the IPC boundary so the
/// CLI can reproduce exit codes without the full error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    InvalidArgument,
    PolicyDenied,
    EngineUnavailable,
    EngineError,
    NotFound,
    Conflict,
    Timeout,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid-argument",
            ErrorKind::PolicyDenied => "policy-denied",
            ErrorKind::EngineUnavailable => "engine-unavailable",
            ErrorKind::EngineError => "engine-error",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Internal => "internal",
        }
    }

    /// Rehydrate a wire error into an [`Error`] with the given message.
    pub fn into_error(self, message: impl Into<String>) -> Error {
        let message = message.into();
        match self {
            ErrorKind::InvalidArgument => Error::InvalidArgument(message),
            ErrorKind::PolicyDenied => Error::PolicyDenied(message),
            ErrorKind::EngineUnavailable => Error::EngineUnavailable(message),
            ErrorKind::EngineError => Error::EngineError { op: "engine".to_string(), message },
            ErrorKind::NotFound => Error::NotFound(message),
            ErrorKind::Conflict => Error::Conflict(message),
            ErrorKind::Timeout => Error::Timeout(message),
            ErrorKind::Internal => Error::Internal(message),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
