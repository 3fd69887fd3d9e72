use std::sync::{Arc, Mutex};

use stagehand::listeners::MonitorListener;
use stagehand::monitor::MonitorEvent;

/// A listener that records every monitor event it receives.
#[derive(Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<MonitorEvent>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the recorded events.
    pub fn events(&self) -> Arc<Mutex<Vec<MonitorEvent>>> {
        Arc::clone(&self.events)
    }
}

impl MonitorListener for RecordingListener {
    fn handle_event(&mut self, event: &MonitorEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
