// src/bus/event.rs

//! Execution event model and tag classification.
//!
//! Tags outside the `orch/` namespace are foreign traffic and classify
//! to `None`; tags inside the namespace with missing payload fields are
//! decode errors the consumer logs and skips.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::{Result, StagehandError};

/// A raw event as read off the bus: a tag plus an untyped payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub tag: String,
    #[serde(default)]
    pub data: Value,
}

/// A classified execution event.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    /// A runner invocation started on the control node.
    RunnerStarted {
        jid: String,
        fun: String,
        args: Vec<String>,
        stamp: Option<String>,
    },
    /// A runner invocation returned.
    RunnerReturned {
        jid: String,
        fun: String,
        args: Vec<String>,
        success: bool,
        stamp: Option<String>,
    },
    /// An asynchronous job was dispatched to a set of target nodes.
    JobStarted {
        jid: String,
        fun: String,
        args: Vec<String>,
        targets: Vec<String>,
        stamp: Option<String>,
    },
    /// One target node returned its result for a job.
    JobReturned {
        jid: String,
        node: String,
        fun: String,
        args: Vec<String>,
        success: bool,
        retcode: i64,
        ret: Option<Value>,
        stamp: Option<String>,
    },
    /// A state module executed on a node reported its result.
    StateResult {
        node: String,
        state_id: String,
        name: String,
        result: bool,
        stamp: Option<String>,
    },
    /// A node reported that it requires a reboot.
    RebootNeeded {
        node: String,
        reason: String,
        stamp: Option<String>,
    },
}

impl ExecutionEvent {
    /// The step identifier this event refers to, if any.
    ///
    /// State applications are identified by the state name they carry as
    /// their first argument; module and runner invocations by the
    /// function name itself.
    pub fn step_id(&self) -> Option<String> {
        match self {
            ExecutionEvent::JobStarted { fun, args, .. }
            | ExecutionEvent::JobReturned { fun, args, .. }
            | ExecutionEvent::RunnerStarted { fun, args, .. }
            | ExecutionEvent::RunnerReturned { fun, args, .. } => Some(state_or_fun(fun, args)),
            ExecutionEvent::StateResult { state_id, .. } => Some(state_id.clone()),
            ExecutionEvent::RebootNeeded { .. } => None,
        }
    }
}

fn state_or_fun(fun: &str, args: &[String]) -> String {
    if is_state_fun(fun) {
        args.first().cloned().unwrap_or_else(|| fun.to_string())
    } else {
        fun.to_string()
    }
}

/// Functions whose first argument names the state being applied.
fn is_state_fun(fun: &str) -> bool {
    matches!(fun, "state.apply" | "state.sls" | "state.orch")
}

static RUN_NEW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^orch/run/([^/]+)/new$").unwrap());
static RUN_RET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^orch/run/([^/]+)/ret$").unwrap());
static JOB_NEW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^orch/job/([^/]+)/new$").unwrap());
static JOB_RET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^orch/job/([^/]+)/ret/(.+)$").unwrap());
static STATE_RESULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^orch/state_result/(.+)$").unwrap());
static REBOOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^orch/reboot/(.+)$").unwrap());

/// Classify a raw event by tag.
///
/// Returns `Ok(None)` for tags outside the orchestration namespace.
pub fn classify(raw: &RawEvent) -> Result<Option<ExecutionEvent>> {
    let tag = raw.tag.as_str();
    let data = &raw.data;

    if let Some(caps) = RUN_NEW.captures(tag) {
        return Ok(Some(ExecutionEvent::RunnerStarted {
            jid: caps[1].to_string(),
            fun: require_str(tag, data, "fun")?,
            args: str_list(data, "fun_args"),
            stamp: opt_str(data, "_stamp"),
        }));
    }
    if let Some(caps) = RUN_RET.captures(tag) {
        return Ok(Some(ExecutionEvent::RunnerReturned {
            jid: caps[1].to_string(),
            fun: require_str(tag, data, "fun")?,
            args: str_list(data, "fun_args"),
            success: require_bool(tag, data, "success")?,
            stamp: opt_str(data, "_stamp"),
        }));
    }
    if let Some(caps) = JOB_NEW.captures(tag) {
        return Ok(Some(ExecutionEvent::JobStarted {
            jid: caps[1].to_string(),
            fun: require_str(tag, data, "fun")?,
            args: str_list(data, "arg"),
            targets: str_list(data, "targets"),
            stamp: opt_str(data, "_stamp"),
        }));
    }
    if let Some(caps) = JOB_RET.captures(tag) {
        return Ok(Some(ExecutionEvent::JobReturned {
            jid: caps[1].to_string(),
            node: caps[2].to_string(),
            fun: require_str(tag, data, "fun")?,
            args: str_list(data, "arg"),
            success: require_bool(tag, data, "success")?,
            retcode: data.get("retcode").and_then(Value::as_i64).unwrap_or(0),
            ret: data.get("return").cloned(),
            stamp: opt_str(data, "_stamp"),
        }));
    }
    if let Some(caps) = STATE_RESULT.captures(tag) {
        return Ok(Some(ExecutionEvent::StateResult {
            node: caps[1].to_string(),
            state_id: require_str(tag, data, "state_id")?,
            name: opt_str(data, "name").unwrap_or_default(),
            result: require_bool(tag, data, "result")?,
            stamp: opt_str(data, "_stamp"),
        }));
    }
    if let Some(caps) = REBOOT.captures(tag) {
        return Ok(Some(ExecutionEvent::RebootNeeded {
            node: caps[1].to_string(),
            reason: opt_str(data, "reason").unwrap_or_default(),
            stamp: opt_str(data, "_stamp"),
        }));
    }

    Ok(None)
}

fn require_str(tag: &str, data: &Value, key: &str) -> Result<String> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StagehandError::EventDecode {
            tag: tag.to_string(),
            reason: format!("missing field '{key}'"),
        })
}

fn require_bool(tag: &str, data: &Value, key: &str) -> Result<bool> {
    data.get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| StagehandError::EventDecode {
            tag: tag.to_string(),
            reason: format!("missing field '{key}'"),
        })
}

fn opt_str(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

fn str_list(data: &Value, key: &str) -> Vec<String> {
    data.get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
