// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal HTTP/1.1 GET for health probes.
//!
//! The only HTTP the parent speaks is the vector-index heartbeat, so a
//! handful of lines over `TcpStream` beats carrying a client stack.

use hal_core::{Error, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Issue a GET and return the response status code.
pub async fn get_status(addr: &str, path: &str) -> Result<u16> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|e| Error::Internal(format!("connect {}: {}", addr, e)))?;

    let request = format!("GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", path, addr);
    stream.write_all(request.as_bytes()).await?;

    // The status line is all we need; read a bounded chunk.
    let mut buf = [0u8; 512];
    let n = stream.read(&mut buf).await?;
    let head = String::from_utf8_lossy(&buf[..n]);
    parse_status_line(&head)
        .ok_or_else(|| Error::Internal(format!("malformed HTTP response from {}", addr)))
}

/// GET returning whether the endpoint answered 200.
pub async fn get_ok(addr: &str, path: &str) -> bool {
    matches!(get_status(addr, path).await, Ok(200))
}

fn parse_status_line(head: &str) -> Option<u16> {
    let line = head.lines().next()?;
    let mut parts = line.split_whitespace();
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
