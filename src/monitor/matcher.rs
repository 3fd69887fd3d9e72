// src/monitor/matcher.rs

//! Pure step-matching core.
//!
//! This is a synchronous, deterministic state machine: classified
//! execution events go in, zero or more [`MonitorEvent`]s come out. It
//! owns the plan cursor and the in-flight step accounting, and performs
//! no IO, so the whole matching behaviour is unit-testable without
//! Tokio, sockets, or processes. The async shell in [`super`] feeds it
//! from the bus and fans its output out to listeners.
//!
//! Cursor rules:
//! - an orchestration-run start for the monitored stage resets the
//!   cursor to the plan head;
//! - a step start matching the cursor emits `StepStarted` and does NOT
//!   advance;
//! - advancement happens on completion (all expected returns received,
//!   a runner return, or a newer step starting while one is in flight);
//! - an identifier with no match at the cursor synthesizes an ad-hoc
//!   step inserted at the cursor position.

use tracing::debug;

use crate::bus::event::ExecutionEvent;
use crate::plan::{PlannedStep, StepPlan};

use super::event::MonitorEvent;

struct InFlight {
    id: String,
    dynamic: bool,
    /// Number of target nodes expected to return; 0 when unknown.
    expected: usize,
    returned: usize,
    all_ok: bool,
}

pub struct StepMatcher {
    stage: String,
    plan: StepPlan,
    cursor: usize,
    show_state_steps: bool,
    show_dynamic_steps: bool,
    in_flight: Option<InFlight>,
}

impl StepMatcher {
    pub fn new(
        stage: impl Into<String>,
        plan: StepPlan,
        show_state_steps: bool,
        show_dynamic_steps: bool,
    ) -> Self {
        Self {
            stage: stage.into(),
            plan,
            cursor: 0,
            show_state_steps,
            show_dynamic_steps,
            in_flight: None,
        }
    }

    /// Current cursor position (exposed for tests).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current plan length, including synthesized steps.
    pub fn plan_len(&self) -> usize {
        self.plan.len()
    }

    /// Feed one classified execution event through the matcher.
    pub fn process(&mut self, event: &ExecutionEvent) -> Vec<MonitorEvent> {
        match event {
            ExecutionEvent::RunnerStarted { fun, args, .. }
                if self.is_stage_orchestration(fun, args) =>
            {
                debug!(stage = %self.stage, "orchestration run started, resetting cursor");
                self.cursor = 0;
                self.in_flight = None;
                Vec::new()
            }
            ExecutionEvent::RunnerReturned { fun, args, .. }
                if self.is_stage_orchestration(fun, args) =>
            {
                // Stage finished; close out whatever is still in flight.
                self.flush_in_flight()
            }
            ExecutionEvent::RunnerStarted { .. } => {
                // A runner step runs once on the control node.
                let id = event.step_id().unwrap_or_default();
                self.start_step(id, Vec::new(), 1)
            }
            ExecutionEvent::RunnerReturned { success, .. } => {
                let id = event.step_id().unwrap_or_default();
                self.complete_step(&id, *success)
            }
            ExecutionEvent::JobStarted { targets, .. } => {
                let id = event.step_id().unwrap_or_default();
                self.start_step(id, targets.clone(), targets.len())
            }
            ExecutionEvent::JobReturned { node, success, ret, .. } => {
                let id = event.step_id().unwrap_or_default();
                self.node_return(id, node.clone(), *success, ret.clone())
            }
            ExecutionEvent::StateResult { node, state_id, result, .. } => {
                self.state_result(state_id.clone(), node.clone(), *result)
            }
            // Reboot signals bypass every suppression flag.
            ExecutionEvent::RebootNeeded { node, reason, .. } => vec![MonitorEvent::RebootNeeded {
                node: node.clone(),
                reason: reason.clone(),
            }],
        }
    }

    fn is_stage_orchestration(&self, fun: &str, args: &[String]) -> bool {
        fun == "state.orch" && args.first().map(String::as_str) == Some(self.stage.as_str())
    }

    fn visible(&self, dynamic: bool) -> bool {
        if dynamic {
            self.show_dynamic_steps
        } else {
            self.show_state_steps
        }
    }

    /// Begin a step: match it at the cursor or synthesize an ad-hoc one.
    fn start_step(
        &mut self,
        id: String,
        targets: Vec<String>,
        expected: usize,
    ) -> Vec<MonitorEvent> {
        // A repeated start of the in-flight step resets its accounting.
        if self.in_flight.as_ref().is_some_and(|f| f.id == id) {
            let f = self.in_flight.as_mut().unwrap();
            f.expected = expected;
            f.returned = 0;
            f.all_ok = true;
            let dynamic = f.dynamic;
            let mut out = Vec::new();
            if self.visible(dynamic) {
                if let Some(step) = self.plan.get(self.cursor).cloned() {
                    out.push(MonitorEvent::StepStarted {
                        step,
                        index: self.cursor,
                        total: self.plan.len(),
                        targets,
                    });
                }
            }
            return out;
        }

        let mut out = self.flush_in_flight();

        let (step, dynamic) = match self.plan.get(self.cursor) {
            Some(step) if step.id == id => (step.clone(), step.dynamic),
            _ => {
                debug!(%id, cursor = self.cursor, "step not in plan, synthesizing");
                let step = PlannedStep::synthesized(&id);
                self.plan.insert(self.cursor, step.clone());
                (step, true)
            }
        };

        self.in_flight = Some(InFlight {
            id,
            dynamic,
            expected,
            returned: 0,
            all_ok: true,
        });

        if self.visible(dynamic) {
            out.push(MonitorEvent::StepStarted {
                step,
                index: self.cursor,
                total: self.plan.len(),
                targets,
            });
        }
        out
    }

    /// One node returned its result for a job step.
    fn node_return(
        &mut self,
        id: String,
        node: String,
        success: bool,
        ret: Option<serde_json::Value>,
    ) -> Vec<MonitorEvent> {
        let mut out = Vec::new();

        if !self.in_flight.as_ref().is_some_and(|f| f.id == id) {
            // Completion for a step whose start we never saw.
            out.extend(self.start_step(id.clone(), Vec::new(), 0));
        }

        let f = match self.in_flight.as_mut() {
            Some(f) => f,
            None => return out,
        };
        f.returned += 1;
        f.all_ok &= success;
        let dynamic = f.dynamic;
        let complete = f.expected > 0 && f.returned >= f.expected;

        if self.visible(dynamic) {
            out.push(MonitorEvent::NodeResult {
                step_id: id,
                node,
                success,
                ret,
            });
        }
        if complete {
            out.extend(self.flush_in_flight());
        }
        out
    }

    /// A runner step returned; completes in one event.
    fn complete_step(&mut self, id: &str, success: bool) -> Vec<MonitorEvent> {
        let mut out = Vec::new();
        if !self.in_flight.as_ref().is_some_and(|f| f.id == id) {
            out.extend(self.start_step(id.to_string(), Vec::new(), 1));
        }
        if let Some(f) = self.in_flight.as_mut() {
            f.all_ok &= success;
        }
        out.extend(self.flush_in_flight());
        out
    }

    /// A state module result from one node, attached to the in-flight
    /// step when there is one.
    fn state_result(&mut self, state_id: String, node: String, result: bool) -> Vec<MonitorEvent> {
        let visible = match self.in_flight.as_ref() {
            Some(f) => self.visible(f.dynamic),
            // Orphan results count as runtime-generated output.
            None => self.show_dynamic_steps,
        };
        if !visible {
            return Vec::new();
        }
        vec![MonitorEvent::NodeResult {
            step_id: state_id,
            node,
            success: result,
            ret: None,
        }]
    }

    /// Complete the in-flight step (if any) and advance the cursor past it.
    fn flush_in_flight(&mut self) -> Vec<MonitorEvent> {
        let Some(f) = self.in_flight.take() else {
            return Vec::new();
        };
        let step = self
            .plan
            .get(self.cursor)
            .cloned()
            .unwrap_or_else(|| PlannedStep::synthesized(&f.id));
        let index = self.cursor;
        self.cursor += 1;
        if self.visible(f.dynamic) {
            vec![MonitorEvent::StepCompleted {
                step,
                index,
                total: self.plan.len(),
                success: f.all_ok,
            }]
        } else {
            Vec::new()
        }
    }
}
