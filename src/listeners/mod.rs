// src/listeners/mod.rs

//! Monitor event listeners.
//!
//! Anything implementing [`MonitorListener`] can be registered on the
//! monitor and will receive every monitor event, in registration order,
//! from the consuming task:
//!
//! - [`printer`] renders progress to the terminal (full step list or
//!   minimal one-line-per-event).
//! - [`reboot`] watches for reboot signals, accumulates affected nodes
//!   and interrupts the monitor once per episode.
//!
//! [`MonitorControl`] is the narrow surface a listener needs to steer
//! the monitor; production code passes a `MonitorHandle`, tests a
//! counting fake.

use crate::monitor::MonitorEvent;

pub mod printer;
pub mod reboot;

pub use printer::{SimplePrinter, StepListPrinter};
pub use reboot::{RebootListener, RebootState, RebootedNode};

/// Capability to receive monitor events.
///
/// Handlers run synchronously on the monitor's consuming task; a
/// listener that blocks stalls delivery to every listener after it.
pub trait MonitorListener: Send {
    fn handle_event(&mut self, event: &MonitorEvent);
}

/// Interruption surface of the monitor, as seen by listeners.
pub trait MonitorControl: Send {
    fn is_interrupting(&self) -> bool;
    fn interrupt(&self);
}
