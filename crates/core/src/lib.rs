// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hal-core: core types for the HAL-9000 orchestrator.
//!
//! Everything the other crates agree on lives here: the validation boundary
//! for untrusted CLI input, deterministic session naming, the image
//! allowlist, resource limits, persisted record shapes, the error type, and
//! the clock abstraction used to drive periodic loops in tests.

pub mod allowlist;
pub mod clock;
pub mod error;
pub mod limits;
pub mod names;
pub mod records;
pub mod validate;

pub use allowlist::{ImageAllowlist, ImageRef};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{Error, ErrorKind, Result};
pub use limits::ResourceLimits;
pub use names::{derive_session_name, SESSION_PREFIX};
pub use records::{Health, Session, WorkerRecord, WorkerState};
pub use validate::{Profile, ProjectPath, WorkerName};
