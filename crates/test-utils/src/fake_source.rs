use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use stagehand::bus::event::RawEvent;
use stagehand::bus::source::EventSource;
use stagehand::errors::{Result, StagehandError};

/// What the fake source does once its scripted events are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterScript {
    /// Block forever, like a quiet bus. The monitor only ends via
    /// interrupt draining or `stop`.
    Hang,
    /// Fail the next read, like a lost connection.
    TransportLost,
}

/// A fake event source that replays a fixed event sequence.
pub struct FakeEventSource {
    events: VecDeque<RawEvent>,
    after: AfterScript,
}

impl FakeEventSource {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self {
            events: events.into(),
            after: AfterScript::Hang,
        }
    }

    pub fn ending_with(mut self, after: AfterScript) -> Self {
        self.after = after;
        self
    }
}

impl EventSource for FakeEventSource {
    fn next_event(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<RawEvent>>> + Send + '_>> {
        // Pop inside the future so a cancelled, never-polled read does
        // not lose an event.
        Box::pin(async move {
            match self.events.pop_front() {
                Some(event) => Ok(Some(event)),
                None => match self.after {
                    AfterScript::Hang => std::future::pending().await,
                    AfterScript::TransportLost => Err(StagehandError::TransportLost(
                        "scripted event sequence ended".to_string(),
                    )),
                },
            }
        })
    }
}
