// src/bus/mod.rs

//! Event-bus subscription layer.
//!
//! The remote-execution framework publishes execution telemetry as
//! newline-delimited JSON on a Unix socket. This module is the only part
//! of the crate that talks to that bus:
//!
//! - [`event`] models raw events and classifies their tags into typed
//!   [`event::ExecutionEvent`]s.
//! - [`source`] provides the `EventSource` trait the monitor consumes
//!   from, and the production `SocketEventSource` implementation.

pub mod event;
pub mod source;

pub use event::{ExecutionEvent, RawEvent, classify};
pub use source::{EventSource, SocketEventSource};
