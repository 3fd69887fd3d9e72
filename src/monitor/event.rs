// src/monitor/event.rs

use serde_json::Value;

use crate::plan::PlannedStep;

/// Normalized monitor output, one per relevant execution event.
///
/// Emission order matches the order the execution events were received.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// A planned (or synthesized) step began executing.
    StepStarted {
        step: PlannedStep,
        /// Position of the step in the plan, 0-based.
        index: usize,
        /// Plan length at emission time (grows with synthesized steps).
        total: usize,
        targets: Vec<String>,
    },
    /// A step finished; `success` folds every target's success flag.
    StepCompleted {
        step: PlannedStep,
        index: usize,
        total: usize,
        success: bool,
    },
    /// A single node reported a result under the in-flight step.
    NodeResult {
        step_id: String,
        node: String,
        success: bool,
        ret: Option<Value>,
    },
    /// A node reported it requires a reboot. Always emitted, regardless
    /// of the step visibility flags.
    RebootNeeded { node: String, reason: String },
}
