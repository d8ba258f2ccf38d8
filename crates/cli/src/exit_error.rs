// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error-kind to exit-code mapping.

use std::process::ExitCode;

use hal_core::{Error, ErrorKind};

/// `Conflict` (already running, claim race) exits 2; everything else 1.
pub fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Conflict => 2,
        _ => 1,
    }
}

pub fn fail(e: &Error) -> ExitCode {
    eprintln!("hal: {}", e);
    ExitCode::from(exit_code(e.kind()))
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
