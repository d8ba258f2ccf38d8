// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod attach;
pub mod daemon;
pub mod list;
pub mod pool;
pub mod spawn;
pub mod stop;

use std::process::ExitCode;

use hal_core::{Error, Result};
use hal_daemon::protocol::AttachInfo;

pub(crate) const OK: ExitCode = ExitCode::SUCCESS;

/// Stream the session's pane to this terminal until the user detaches.
pub(crate) fn attach_tty(attach: &AttachInfo) -> Result<()> {
    let status = std::process::Command::new("tmux")
        .arg("-S")
        .arg(&attach.tmux_socket)
        .arg("attach-session")
        .arg("-t")
        .arg(&attach.tmux_session)
        .status()
        .map_err(|e| Error::Internal(format!("failed to run tmux: {}", e)))?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::Internal(format!("tmux attach exited with {}", status)))
    }
}
