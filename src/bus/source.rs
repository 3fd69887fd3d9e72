// src/bus/source.rs

//! Pluggable event source abstraction.
//!
//! The monitor consumes from an `EventSource` instead of a raw socket.
//! Production uses [`SocketEventSource`]; tests can provide a scripted
//! implementation that replays a fixed event sequence.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::UnixStream;

use crate::errors::{Result, StagehandError};

use super::event::RawEvent;

/// Trait abstracting where execution events come from.
///
/// `next_event` resolves to:
/// - `Ok(Some(event))` for a delivered event,
/// - `Ok(None)` for a null/keepalive read (callers back off briefly),
/// - `Err(EventDecode)` for an undecodable event (callers log and skip),
/// - any other error for a lost transport (fatal to the consumer).
pub trait EventSource: Send {
    fn next_event(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<RawEvent>>> + Send + '_>>;
}

/// Production event source: newline-delimited JSON over the framework's
/// Unix socket.
pub struct SocketEventSource {
    lines: Lines<BufReader<UnixStream>>,
}

impl SocketEventSource {
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).await.map_err(|e| {
            StagehandError::TransportLost(format!("connecting to {}: {e}", path.display()))
        })?;
        Ok(Self {
            lines: BufReader::new(stream).lines(),
        })
    }
}

impl EventSource for SocketEventSource {
    fn next_event(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<RawEvent>>> + Send + '_>> {
        Box::pin(async move {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| StagehandError::TransportLost(e.to_string()))?;

            let Some(line) = line else {
                return Err(StagehandError::TransportLost(
                    "event stream closed".to_string(),
                ));
            };

            if line.trim().is_empty() {
                return Ok(None);
            }

            let raw: RawEvent =
                serde_json::from_str(&line).map_err(|e| StagehandError::EventDecode {
                    tag: "<unparsed>".to_string(),
                    reason: e.to_string(),
                })?;
            Ok(Some(raw))
        })
    }
}
