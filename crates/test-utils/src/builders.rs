#![allow(dead_code)]

//! Builders for raw bus events, so tests read as event scripts.

use serde_json::json;
use stagehand::bus::event::RawEvent;

fn raw(tag: String, data: serde_json::Value) -> RawEvent {
    RawEvent { tag, data }
}

/// Orchestration-run start for a stage.
pub fn run_started(jid: &str, stage: &str) -> RawEvent {
    raw(
        format!("orch/run/{jid}/new"),
        json!({"fun": "state.orch", "fun_args": [stage]}),
    )
}

/// Orchestration-run completion for a stage.
pub fn run_returned(jid: &str, stage: &str, success: bool) -> RawEvent {
    raw(
        format!("orch/run/{jid}/ret"),
        json!({"fun": "state.orch", "fun_args": [stage], "success": success}),
    )
}

/// A runner step starting on the control node.
pub fn runner_started(jid: &str, fun: &str) -> RawEvent {
    raw(format!("orch/run/{jid}/new"), json!({"fun": fun, "fun_args": []}))
}

/// A runner step returning.
pub fn runner_returned(jid: &str, fun: &str, success: bool) -> RawEvent {
    raw(
        format!("orch/run/{jid}/ret"),
        json!({"fun": fun, "fun_args": [], "success": success}),
    )
}

/// A state application dispatched to target nodes.
pub fn job_started(jid: &str, state: &str, targets: &[&str]) -> RawEvent {
    raw(
        format!("orch/job/{jid}/new"),
        json!({"fun": "state.apply", "arg": [state], "targets": targets}),
    )
}

/// One node's return for a state application.
pub fn job_returned(jid: &str, state: &str, node: &str, success: bool) -> RawEvent {
    raw(
        format!("orch/job/{jid}/ret/{node}"),
        json!({
            "fun": "state.apply",
            "arg": [state],
            "success": success,
            "retcode": if success { 0 } else { 1 },
        }),
    )
}

/// A state module result from one node.
pub fn state_result(node: &str, state_id: &str, name: &str, result: bool) -> RawEvent {
    raw(
        format!("orch/state_result/{node}"),
        json!({"state_id": state_id, "name": name, "result": result}),
    )
}

/// A node announcing it requires a reboot.
pub fn reboot_needed(node: &str, reason: &str) -> RawEvent {
    raw(format!("orch/reboot/{node}"), json!({"reason": reason}))
}

/// An event outside the orchestration namespace.
pub fn foreign(tag: &str) -> RawEvent {
    raw(tag.to_string(), json!({}))
}
