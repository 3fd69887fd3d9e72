// tests/reboot_episode.rs

//! Reboot-pause behaviour: the reboot listener interrupts the monitor,
//! late correlated events are drained, and the episode accumulates every
//! affected node.

use stagehand::listeners::RebootListener;
use stagehand::monitor::Monitor;
use stagehand::plan::{PlannedStep, StepPlan};

use stagehand_test_utils::builders::*;
use stagehand_test_utils::fake_source::FakeEventSource;
use stagehand_test_utils::{init_tracing, with_timeout};

fn plan() -> StepPlan {
    StepPlan::from_steps(vec![PlannedStep::new("updates", "apply updates")]).unwrap()
}

#[tokio::test]
async fn reboot_signal_interrupts_and_accumulates_nodes() {
    init_tracing();

    let source = FakeEventSource::new(vec![
        job_started("1", "updates", &["osd1", "osd2"]),
        reboot_needed("osd1", "kernel update"),
        // These arrive after the interrupt and must still be drained.
        reboot_needed("osd2", "glibc update"),
        reboot_needed("osd1", "kernel update"),
        job_returned("1", "updates", "osd1", true),
    ]);

    let mut monitor = Monitor::new("cluster.stage.0", plan(), true, true);
    let rebooter = RebootListener::new(monitor.handle());
    let reboot_state = rebooter.state();
    monitor.add_listener(Box::new(rebooter));

    monitor.start(Box::new(source));
    with_timeout(monitor.wait_to_finish()).await;

    let state = reboot_state.lock().unwrap();
    assert!(state.reboot_required());
    let nodes: Vec<_> = state
        .nodes()
        .iter()
        .map(|n| (n.node.as_str(), n.reason.as_str()))
        .collect();
    // The duplicate signal from osd1 was merged.
    assert_eq!(
        nodes,
        vec![("osd1", "kernel update"), ("osd2", "glibc update")]
    );
}

#[tokio::test]
async fn reboot_events_survive_step_suppression() {
    init_tracing();

    let source = FakeEventSource::new(vec![
        job_started("1", "updates", &["osd1"]),
        reboot_needed("osd1", ""),
    ]);

    // Both visibility flags off: reboot signals must still reach the
    // listener.
    let mut monitor = Monitor::new("cluster.stage.0", plan(), false, false);
    let rebooter = RebootListener::new(monitor.handle());
    let reboot_state = rebooter.state();
    monitor.add_listener(Box::new(rebooter));

    monitor.start(Box::new(source));
    with_timeout(monitor.wait_to_finish()).await;

    let state = reboot_state.lock().unwrap();
    assert!(state.reboot_required());
    assert_eq!(state.nodes().len(), 1);
    assert_eq!(state.nodes()[0].reason, "");
}
