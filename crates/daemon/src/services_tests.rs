// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hal_core::ErrorKind;

fn index() -> VectorIndex {
    VectorIndex::new(VectorIndexConfig {
        host: "0.0.0.0".to_string(),
        port: 8000,
        data_dir: PathBuf::from("/data/chromadb"),
    })
}

#[test]
fn wildcard_bind_probes_loopback() {
    let config = VectorIndexConfig {
        host: "0.0.0.0".to_string(),
        port: 8123,
        data_dir: PathBuf::new(),
    };
    assert_eq!(config.probe_addr(), "127.0.0.1:8123");

    let pinned = VectorIndexConfig {
        host: "10.0.0.7".to_string(),
        port: 8123,
        data_dir: PathBuf::new(),
    };
    assert_eq!(pinned.probe_addr(), "10.0.0.7:8123");
}

#[test]
fn health_starts_in_starting() {
    assert_eq!(index().health(), Health::Starting);
}

#[test]
fn first_success_transitions_to_ok() {
    let index = index();
    assert_eq!(index.observe(true), Health::Ok);
}

#[test]
fn misses_while_starting_never_fail() {
    let index = index();
    for _ in 0..10 {
        assert_eq!(index.observe(false), Health::Starting);
    }
}

#[test]
fn three_consecutive_misses_fail_an_ok_service() {
    let index = index();
    index.observe(true);
    assert_eq!(index.observe(false), Health::Ok);
    assert_eq!(index.observe(false), Health::Ok);
    assert_eq!(index.observe(false), Health::Failed);
}

#[test]
fn intervening_success_resets_the_miss_count() {
    let index = index();
    index.observe(true);
    index.observe(false);
    index.observe(false);
    index.observe(true);
    index.observe(false);
    index.observe(false);
    assert_eq!(index.health(), Health::Ok);
}

#[tokio::test]
async fn wait_ready_times_out_against_nothing() {
    // Port 1 on loopback: connection refused, heartbeat never succeeds.
    let index = VectorIndex::new(VectorIndexConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        data_dir: PathBuf::new(),
    });
    let err = index.wait_ready(Duration::from_millis(50)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn wait_ready_succeeds_against_live_endpoint() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { break };
            let mut buf = [0u8; 512];
            let _ = tokio::io::AsyncReadExt::read(&mut stream, &mut buf).await;
            let _ = tokio::io::AsyncWriteExt::write_all(
                &mut stream,
                b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n",
            )
            .await;
        }
    });

    let index = VectorIndex::new(VectorIndexConfig {
        host: "127.0.0.1".to_string(),
        port,
        data_dir: PathBuf::new(),
    });
    index.wait_ready(Duration::from_secs(5)).await.unwrap();
    assert_eq!(index.health(), Health::Ok);
}
