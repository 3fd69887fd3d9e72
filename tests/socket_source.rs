// tests/socket_source.rs

//! The production event source against a real Unix socket.

#![cfg(unix)]

use tokio::io::AsyncWriteExt;
use tokio::net::UnixListener;

use stagehand::bus::source::{EventSource, SocketEventSource};
use stagehand::errors::StagehandError;

use stagehand_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn socket_source_reads_newline_delimited_json() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.sock");
    let listener = UnixListener::bind(&path).unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream
            .write_all(
                b"{\"tag\": \"orch/reboot/n1\", \"data\": {\"reason\": \"kernel update\"}}\n\
                  \n\
                  this is not json\n",
            )
            .await
            .unwrap();
        // Dropping the stream closes the transport.
    });

    let mut source = SocketEventSource::connect(&path).await.unwrap();

    let event = with_timeout(source.next_event()).await.unwrap().unwrap();
    assert_eq!(event.tag, "orch/reboot/n1");
    assert_eq!(event.data["reason"], "kernel update");

    // Blank line: a null read, not an error.
    let empty = with_timeout(source.next_event()).await.unwrap();
    assert!(empty.is_none());

    // Garbage line: a per-event decode error, not a transport loss.
    let err = with_timeout(source.next_event()).await.unwrap_err();
    assert!(matches!(err, StagehandError::EventDecode { .. }));

    // Closed stream: transport lost.
    let err = with_timeout(source.next_event()).await.unwrap_err();
    assert!(matches!(err, StagehandError::TransportLost(_)));

    server.await.unwrap();
}

#[tokio::test]
async fn connect_to_missing_socket_is_transport_lost() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let err = SocketEventSource::connect(dir.path().join("absent.sock"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StagehandError::TransportLost(_)));
}
