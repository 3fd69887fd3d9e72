// src/monitor/mod.rs

//! Event monitor: consumes the bus on a background task, matches events
//! against the step plan, and fans the normalized output out to
//! listeners.
//!
//! The pure matching core lives in [`matcher`]; this module is the async
//! shell around it. It owns the lifecycle
//! `idle → running → {interrupted} → finished` and the consuming task:
//!
//! - interruption is cooperative: `interrupt()` flips the state and the
//!   task drains events still arriving before it exits;
//! - `stop(wait)` requests the task to end, escalating to an abort after
//!   a bounded grace period;
//! - `wait_to_finish()` blocks until the task has fully drained, used
//!   after a reboot episode so late correlated events are not lost.
//!
//! Listeners are invoked synchronously from the consuming task, in
//! registration order; a listener that blocks stalls event delivery for
//! everything after it.

pub mod event;
pub mod matcher;

pub use event::MonitorEvent;
pub use matcher::StepMatcher;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, trace, warn};

use crate::bus::event::classify;
use crate::bus::source::EventSource;
use crate::errors::StagehandError;
use crate::listeners::{MonitorControl, MonitorListener};
use crate::plan::StepPlan;

/// How long the consuming task keeps reading after an interrupt before
/// it considers the stream drained.
const DRAIN_QUIET_PERIOD: Duration = Duration::from_millis(500);
/// Backoff after a null/keepalive read, so an idle bus is not
/// tight-polled.
const EMPTY_READ_BACKOFF: Duration = Duration::from_millis(100);
/// Grace period for `stop(wait = true)` before the task is aborted.
const STOP_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Running,
    Interrupted,
    Finished,
}

/// Why the consuming task ended. Meaningful once the state is
/// `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Normal end: stop requested or interrupt drain completed.
    Clean,
    /// The connection to the event bus was lost.
    TransportLost,
    /// The task exceeded the stop grace period and was aborted.
    Forced,
}

#[derive(Debug)]
struct MonitorShared {
    state: watch::Sender<MonitorState>,
    stop: AtomicBool,
    end_reason: Mutex<Option<EndReason>>,
}

impl MonitorShared {
    fn is_running(&self) -> bool {
        matches!(
            *self.state.borrow(),
            MonitorState::Running | MonitorState::Interrupted
        )
    }

    fn is_interrupting(&self) -> bool {
        *self.state.borrow() == MonitorState::Interrupted
    }

    fn interrupt(&self) {
        self.state.send_if_modified(|s| {
            if *s == MonitorState::Running {
                *s = MonitorState::Interrupted;
                true
            } else {
                false
            }
        });
    }

    fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        // Wake a read blocked on a quiet bus so the task can notice the
        // flag.
        self.state.send_modify(|_| {});
    }

    fn finish(&self, reason: EndReason) {
        let mut end = self.end_reason.lock().unwrap();
        if end.is_none() {
            *end = Some(reason);
        }
        drop(end);
        self.state.send_replace(MonitorState::Finished);
    }
}

/// Cloneable handle for interacting with a running monitor from other
/// tasks (listeners, signal handlers).
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    shared: Arc<MonitorShared>,
}

impl MonitorHandle {
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Request the consuming task to end without waiting for it.
    pub fn request_stop(&self) {
        self.shared.request_stop();
    }
}

impl MonitorControl for MonitorHandle {
    fn is_interrupting(&self) -> bool {
        self.shared.is_interrupting()
    }

    fn interrupt(&self) {
        self.shared.interrupt();
    }
}

/// The event monitor.
pub struct Monitor {
    shared: Arc<MonitorShared>,
    matcher: Option<StepMatcher>,
    listeners: Vec<Box<dyn MonitorListener>>,
    task: Option<JoinHandle<()>>,
}

impl Monitor {
    pub fn new(
        stage: impl Into<String>,
        plan: StepPlan,
        show_state_steps: bool,
        show_dynamic_steps: bool,
    ) -> Self {
        let (state, _) = watch::channel(MonitorState::Idle);
        Self {
            shared: Arc::new(MonitorShared {
                state,
                stop: AtomicBool::new(false),
                end_reason: Mutex::new(None),
            }),
            matcher: Some(StepMatcher::new(
                stage,
                plan,
                show_state_steps,
                show_dynamic_steps,
            )),
            listeners: Vec::new(),
            task: None,
        }
    }

    /// Register a listener. Listeners are invoked in registration order
    /// for every monitor event.
    pub fn add_listener(&mut self, listener: Box<dyn MonitorListener>) {
        self.listeners.push(listener);
    }

    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    pub fn is_interrupting(&self) -> bool {
        self.shared.is_interrupting()
    }

    /// Request a transition to `interrupted`. Idempotent, safe from any
    /// task; consumption continues until the stream drains.
    pub fn interrupt(&self) {
        self.shared.interrupt();
    }

    /// Why the consuming task ended, once finished.
    pub fn end_reason(&self) -> Option<EndReason> {
        *self.shared.end_reason.lock().unwrap()
    }

    /// Start consuming events on a background task. Non-blocking; a
    /// second call is a no-op.
    pub fn start(&mut self, source: Box<dyn EventSource>) {
        if self.task.is_some() {
            debug!("monitor already started");
            return;
        }
        let Some(matcher) = self.matcher.take() else {
            return;
        };
        let listeners = std::mem::take(&mut self.listeners);
        let shared = Arc::clone(&self.shared);
        shared.state.send_replace(MonitorState::Running);
        // Subscribe before spawning so a stop or interrupt issued right
        // after start is never missed.
        let state_rx = shared.state.subscribe();

        info!("event monitor started");
        self.task = Some(tokio::spawn(consume_loop(
            shared, state_rx, matcher, listeners, source,
        )));
    }

    /// Request the consuming task to end. With `wait`, blocks until the
    /// task has exited, aborting it after a short grace period.
    pub async fn stop(&mut self, wait: bool) {
        self.shared.request_stop();
        if !wait {
            return;
        }
        let Some(mut task) = self.task.take() else {
            return;
        };
        match timeout(STOP_GRACE, &mut task).await {
            Ok(_) => debug!("monitor task stopped"),
            Err(_) => {
                warn!("monitor task did not stop within grace period, aborting");
                task.abort();
                self.shared.finish(EndReason::Forced);
            }
        }
    }

    /// Block until the consuming task reaches `finished`. Used to drain
    /// trailing correlated events after an interrupt condition.
    pub async fn wait_to_finish(&mut self) {
        if *self.shared.state.borrow() == MonitorState::Idle {
            return;
        }
        let mut rx = self.shared.state.subscribe();
        let _ = rx.wait_for(|s| *s == MonitorState::Finished).await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

async fn consume_loop(
    shared: Arc<MonitorShared>,
    mut state_rx: watch::Receiver<MonitorState>,
    mut matcher: StepMatcher,
    mut listeners: Vec<Box<dyn MonitorListener>>,
    mut source: Box<dyn EventSource>,
) {
    let mut end = EndReason::Clean;

    loop {
        if shared.stop.load(Ordering::SeqCst) {
            debug!("monitor stop requested");
            break;
        }

        // After an interrupt we keep draining, but only as long as
        // events are still arriving. Before that, a blocking read races
        // against state changes so an interrupt is noticed even on a
        // quiet bus.
        let next = if shared.is_interrupting() {
            match timeout(DRAIN_QUIET_PERIOD, source.next_event()).await {
                Err(_) => {
                    debug!("interrupt drain complete");
                    break;
                }
                Ok(res) => res,
            }
        } else {
            tokio::select! {
                res = source.next_event() => res,
                _ = state_rx.changed() => continue,
            }
        };

        match next {
            Ok(Some(raw)) => match classify(&raw) {
                Ok(Some(event)) => {
                    for monitor_event in matcher.process(&event) {
                        for listener in &mut listeners {
                            listener.handle_event(&monitor_event);
                        }
                    }
                }
                Ok(None) => trace!(tag = %raw.tag, "ignoring foreign event"),
                Err(err) => warn!(error = %err, "skipping undecodable event"),
            },
            Ok(None) => sleep(EMPTY_READ_BACKOFF).await,
            Err(err @ StagehandError::EventDecode { .. }) => {
                warn!(error = %err, "skipping undecodable event")
            }
            Err(err) => {
                warn!(error = %err, "event bus transport lost, monitor ending");
                end = EndReason::TransportLost;
                break;
            }
        }
    }

    shared.finish(end);
    info!(reason = ?end, "event monitor finished");
}
