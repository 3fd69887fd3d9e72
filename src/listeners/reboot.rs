// src/listeners/reboot.rs

//! Reboot detection.
//!
//! Packages installed during a stage can leave nodes with a pending
//! reboot. The affected nodes announce this on the bus; this listener
//! accumulates them and asks the monitor to interrupt so the coordinator
//! can pause the rollout.

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::monitor::MonitorEvent;

use super::{MonitorControl, MonitorListener};

/// One node requiring a reboot. `reason` may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebootedNode {
    pub node: String,
    pub reason: String,
}

/// Accumulated reboot episode, shared with the run coordinator.
#[derive(Debug, Default)]
pub struct RebootState {
    nodes: Vec<RebootedNode>,
    episode: bool,
}

impl RebootState {
    /// True once any reboot signal was observed this run.
    pub fn reboot_required(&self) -> bool {
        self.episode
    }

    /// Unique affected nodes, in order of first appearance.
    pub fn nodes(&self) -> &[RebootedNode] {
        &self.nodes
    }
}

pub struct RebootListener<C: MonitorControl> {
    control: C,
    state: Arc<Mutex<RebootState>>,
}

impl<C: MonitorControl> RebootListener<C> {
    pub fn new(control: C) -> Self {
        Self {
            control,
            state: Arc::new(Mutex::new(RebootState::default())),
        }
    }

    /// Shared view of the accumulated episode, for the coordinator.
    pub fn state(&self) -> Arc<Mutex<RebootState>> {
        Arc::clone(&self.state)
    }
}

impl<C: MonitorControl> MonitorListener for RebootListener<C> {
    fn handle_event(&mut self, event: &MonitorEvent) {
        let MonitorEvent::RebootNeeded { node, reason } = event else {
            return;
        };

        info!(%node, %reason, "node requires a reboot");

        {
            let mut state = self.state.lock().unwrap();
            state.episode = true;
            match state.nodes.iter_mut().find(|n| n.node == *node) {
                // Duplicate signal from the same node: keep the last
                // seen reason.
                Some(existing) => existing.reason = reason.clone(),
                None => state.nodes.push(RebootedNode {
                    node: node.clone(),
                    reason: reason.clone(),
                }),
            }
        }

        if !self.control.is_interrupting() {
            self.control.interrupt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingControl {
        interrupts: Arc<AtomicUsize>,
    }

    impl MonitorControl for CountingControl {
        fn is_interrupting(&self) -> bool {
            self.interrupts.load(Ordering::SeqCst) > 0
        }

        fn interrupt(&self) {
            self.interrupts.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn reboot(node: &str, reason: &str) -> MonitorEvent {
        MonitorEvent::RebootNeeded {
            node: node.to_string(),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn accumulates_unique_nodes_and_interrupts_once() {
        let interrupts = Arc::new(AtomicUsize::new(0));
        let mut listener = RebootListener::new(CountingControl {
            interrupts: Arc::clone(&interrupts),
        });

        listener.handle_event(&reboot("a", "kernel update"));
        listener.handle_event(&reboot("b", "glibc update"));
        listener.handle_event(&reboot("a", "second reason"));

        let state = listener.state();
        let state = state.lock().unwrap();
        assert!(state.reboot_required());
        assert_eq!(
            state.nodes(),
            &[
                RebootedNode { node: "a".into(), reason: "second reason".into() },
                RebootedNode { node: "b".into(), reason: "glibc update".into() },
            ]
        );
        assert_eq!(interrupts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_reboot_events_are_ignored() {
        let interrupts = Arc::new(AtomicUsize::new(0));
        let mut listener = RebootListener::new(CountingControl {
            interrupts: Arc::clone(&interrupts),
        });

        listener.handle_event(&MonitorEvent::NodeResult {
            step_id: "discover".into(),
            node: "n1".into(),
            success: true,
            ret: None,
        });

        assert!(!listener.state().lock().unwrap().reboot_required());
        assert_eq!(interrupts.load(Ordering::SeqCst), 0);
    }
}
