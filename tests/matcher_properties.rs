// tests/matcher_properties.rs

//! Property tests for the step-matching core.

use proptest::prelude::*;

use stagehand::bus::event::ExecutionEvent;
use stagehand::monitor::{MonitorEvent, StepMatcher};
use stagehand::plan::{PlannedStep, StepPlan};

const STAGE: &str = "cluster.stage.1";
const STATIC_IDS: [&str; 3] = ["discover", "configure", "apply"];

#[derive(Debug, Clone)]
enum Op {
    RunStart,
    RunEnd(bool),
    Start(String),
    Return(String, bool),
    Reboot(String),
}

fn op_strategy() -> BoxedStrategy<Op> {
    let id = prop_oneof![
        prop::sample::select(STATIC_IDS.to_vec()).prop_map(String::from),
        Just("mine.update".to_string()),
        Just("grains.refresh".to_string()),
    ]
    .boxed();
    prop_oneof![
        Just(Op::RunStart),
        any::<bool>().prop_map(Op::RunEnd),
        id.clone().prop_map(Op::Start),
        (id, any::<bool>()).prop_map(|(i, ok)| Op::Return(i, ok)),
        prop::sample::select(vec!["n1", "n2"]).prop_map(|n| Op::Reboot(n.to_string())),
    ]
    .boxed()
}

fn to_event(op: &Op) -> ExecutionEvent {
    match op {
        Op::RunStart => ExecutionEvent::RunnerStarted {
            jid: "r".into(),
            fun: "state.orch".into(),
            args: vec![STAGE.into()],
            stamp: None,
        },
        Op::RunEnd(ok) => ExecutionEvent::RunnerReturned {
            jid: "r".into(),
            fun: "state.orch".into(),
            args: vec![STAGE.into()],
            success: *ok,
            stamp: None,
        },
        Op::Start(id) => ExecutionEvent::JobStarted {
            jid: "j".into(),
            fun: "state.apply".into(),
            args: vec![id.clone()],
            targets: vec!["n1".into()],
            stamp: None,
        },
        Op::Return(id, ok) => ExecutionEvent::JobReturned {
            jid: "j".into(),
            node: "n1".into(),
            fun: "state.apply".into(),
            args: vec![id.clone()],
            success: *ok,
            retcode: if *ok { 0 } else { 1 },
            ret: None,
            stamp: None,
        },
        Op::Reboot(node) => ExecutionEvent::RebootNeeded {
            node: node.clone(),
            reason: String::new(),
            stamp: None,
        },
    }
}

fn static_plan() -> StepPlan {
    StepPlan::from_steps(STATIC_IDS.iter().map(|id| PlannedStep::new(*id, *id)).collect())
        .unwrap()
}

proptest! {
    /// The cursor only moves forward, except on an explicit
    /// orchestration-run start.
    #[test]
    fn cursor_never_regresses_without_a_run_start(
        ops in prop::collection::vec(op_strategy(), 0..48)
    ) {
        let mut matcher = StepMatcher::new(STAGE, static_plan(), true, true);
        let mut previous = matcher.cursor();

        for op in &ops {
            matcher.process(&to_event(op));
            match op {
                Op::RunStart => prop_assert_eq!(matcher.cursor(), 0),
                _ => prop_assert!(matcher.cursor() >= previous),
            }
            previous = matcher.cursor();
        }
    }

    /// With dynamic steps suppressed, nothing outside the static plan is
    /// ever emitted, but reboot signals always are.
    #[test]
    fn suppression_hides_dynamic_steps_but_never_reboots(
        ops in prop::collection::vec(op_strategy(), 0..48)
    ) {
        let mut matcher = StepMatcher::new(STAGE, static_plan(), true, false);
        let reboots_fed = ops.iter().filter(|op| matches!(op, Op::Reboot(_))).count();
        let mut reboots_seen = 0;

        for op in &ops {
            for event in matcher.process(&to_event(op)) {
                match event {
                    MonitorEvent::StepStarted { step, .. }
                    | MonitorEvent::StepCompleted { step, .. } => {
                        prop_assert!(STATIC_IDS.contains(&step.id.as_str()));
                    }
                    MonitorEvent::NodeResult { step_id, .. } => {
                        prop_assert!(STATIC_IDS.contains(&step_id.as_str()));
                    }
                    MonitorEvent::RebootNeeded { .. } => reboots_seen += 1,
                }
            }
        }

        prop_assert_eq!(reboots_seen, reboots_fed);
    }

    /// The plan never shrinks: synthesized steps only ever extend it.
    #[test]
    fn plan_only_grows(ops in prop::collection::vec(op_strategy(), 0..48)) {
        let mut matcher = StepMatcher::new(STAGE, static_plan(), true, true);
        let mut previous = matcher.plan_len();

        for op in &ops {
            matcher.process(&to_event(op));
            prop_assert!(matcher.plan_len() >= previous);
            previous = matcher.plan_len();
        }
    }
}
