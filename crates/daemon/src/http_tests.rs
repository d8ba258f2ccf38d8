// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::AsyncWriteExt as _;
use tokio::net::TcpListener;

async fn one_shot_server(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = tokio::io::AsyncReadExt::read(&mut stream, &mut buf).await;
            let _ = stream.write_all(response.as_bytes()).await;
        }
    });
    addr
}

#[tokio::test]
async fn ok_status_parses() {
    let addr = one_shot_server("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}").await;
    assert_eq!(get_status(&addr, "/api/v2/heartbeat").await.unwrap(), 200);
    let addr = one_shot_server("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}").await;
    assert!(get_ok(&addr, "/api/v2/heartbeat").await);
}

#[tokio::test]
async fn error_status_is_not_ok() {
    let addr = one_shot_server("HTTP/1.1 503 Service Unavailable\r\n\r\n").await;
    assert_eq!(get_status(&addr, "/").await.unwrap(), 503);
    let addr = one_shot_server("HTTP/1.1 503 Service Unavailable\r\n\r\n").await;
    assert!(!get_ok(&addr, "/").await);
}

#[tokio::test]
async fn refused_connection_is_not_ok() {
    // Bind-then-drop guarantees an unused port.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    assert!(!get_ok(&addr, "/").await);
}

#[tokio::test]
async fn garbage_response_is_internal_error() {
    let addr = one_shot_server("not http at all").await;
    assert!(get_status(&addr, "/").await.is_err());
}
