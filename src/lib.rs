// src/lib.rs

pub mod bus;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod exit_codes;
pub mod fs;
pub mod listeners;
pub mod logging;
pub mod monitor;
pub mod plan;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::bus::source::{EventSource, SocketEventSource};
use crate::cli::{CliArgs, Command, StageCommand};
use crate::config::{PillarStore, Settings, load_settings};
use crate::errors::{Result, StagehandError};
use crate::exec::StageExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::listeners::reboot::RebootedNode;
use crate::listeners::{MonitorListener, RebootListener, SimplePrinter, StepListPrinter};
use crate::monitor::{EndReason, Monitor};
use crate::plan::render::{CommandRenderer, StageRenderer, stage_file_path};

/// Options for one stage run, derived from the CLI flags.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub stage: String,
    pub simple_output: bool,
    pub show_state_steps: bool,
    pub show_dynamic_steps: bool,
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings + pillar store
/// - stage renderer
/// - event source
/// and hands off to [`run_stage`].
pub async fn run(args: CliArgs) -> Result<i32> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let settings = load_settings(fs.as_ref(), &args.config)?;

    match args.command {
        Command::Stage(StageCommand::Run { stage, simple, no_state_steps, no_dynamic_steps }) => {
            let opts = RunOptions {
                stage,
                simple_output: simple,
                show_state_steps: !no_state_steps,
                show_dynamic_steps: !no_dynamic_steps,
            };
            let store = PillarStore::new(Arc::clone(&fs), settings.pillar_path.clone());
            let renderer = CommandRenderer::new(settings.orch_cmd.clone());
            let source = SocketEventSource::connect(&settings.event_socket).await?;
            run_stage(&settings, &opts, &store, &renderer, Box::new(source)).await
        }
    }
}

/// Run one stage to completion and produce the CLI exit code.
///
/// Renderer, pillar store and event source are passed in so the whole
/// flow can be driven by fakes in tests.
pub async fn run_stage(
    settings: &Settings,
    opts: &RunOptions,
    store: &PillarStore,
    renderer: &dyn StageRenderer,
    source: Box<dyn EventSource>,
) -> Result<i32> {
    let control_node = store.control_node()?;
    info!(%control_node, stage = %opts.stage, "starting stage run");

    // Run options the orchestration states consult. Operator-set values
    // win; these only fill the gaps.
    store.set_if_absent("auto_reboot", toml::Value::Boolean(false))?;
    store.set_if_absent("updates_restart", toml::Value::String("cli".to_string()))?;

    // Rendering failures end the run before any process is launched.
    let plan = match renderer.render(&opts.stage).await {
        Ok(plan) => plan,
        Err(err) if err.is_rendering() => {
            print!("{}", rendering_error_report(&err));
            return Ok(exit_codes::RENDERING_ERROR);
        }
        Err(err) => return Err(err),
    };
    info!(steps = plan.len(), "stage rendered");

    let mut monitor = Monitor::new(
        opts.stage.as_str(),
        plan,
        opts.show_state_steps,
        opts.show_dynamic_steps,
    );
    let printer: Box<dyn MonitorListener> = if opts.simple_output {
        Box::new(SimplePrinter::new())
    } else {
        Box::new(StepListPrinter::new())
    };
    monitor.add_listener(printer);

    let rebooter = RebootListener::new(monitor.handle());
    let reboot_state = rebooter.state();
    monitor.add_listener(Box::new(rebooter));
    monitor.start(source);

    let mut executor = StageExecutor::new(settings.orch_cmd.as_str(), opts.stage.as_str());

    // First cancellation request interrupts a running stage process
    // gracefully; if the process already finished, stop the monitor and
    // end the run.
    {
        let exec_handle = executor.handle();
        let mon_handle = monitor.handle();
        tokio::spawn(async move {
            loop {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                debug!("cancellation requested");
                if exec_handle.is_running() {
                    exec_handle.interrupt();
                } else {
                    if mon_handle.is_running() {
                        mon_handle.request_stop();
                    }
                    std::process::exit(0);
                }
            }
        });
    }

    executor.start()?;
    let exit_code = executor.join().await?;

    let mut reboot_required = reboot_state.lock().unwrap().reboot_required();
    if !reboot_required && monitor.is_running() {
        // Give trailing events a moment to arrive, then stop for real.
        sleep(Duration::from_secs(1)).await;
        monitor.stop(true).await;
        // A reboot signal may have landed during the grace window.
        reboot_required = reboot_state.lock().unwrap().reboot_required();
    }

    if reboot_required {
        debug!("monitor interrupted by a reboot signal, draining");
        monitor.wait_to_finish().await;
        let state = reboot_state.lock().unwrap();
        print!("{}", reboot_report(&opts.stage, &control_node, state.nodes()));
        return Ok(exit_codes::REBOOT_REQUIRED);
    }

    if monitor.end_reason() == Some(EndReason::TransportLost) {
        warn!("event bus connection was lost during the run; progress output may be incomplete");
    }

    Ok(exit_code)
}

/// Operator-facing diagnostic for a rendering failure.
fn rendering_error_report(err: &StagehandError) -> String {
    let mut out = String::new();
    match err {
        StagehandError::StateRendering { states, description } => {
            out.push_str("An error occurred while rendering one of the following states:\n");
            for state in states {
                out.push_str(&format!(
                    "    - {state} ({})\n",
                    stage_file_path(state).display()
                ));
            }
            out.push('\n');
            out.push_str("Error description:\n");
            out.push_str(description);
            out.push('\n');
        }
        StagehandError::StageRendering { stage_file, description } => {
            out.push_str("An error occurred while rendering the stage file:\n");
            out.push_str(&format!("    {}\n\n", stage_file.display()));
            out.push_str("Error description:\n");
            out.push_str(description);
            out.push('\n');
        }
        other => out.push_str(&format!("{other}\n")),
    }
    out
}

/// Operator-facing summary of a reboot episode.
fn reboot_report(stage: &str, control_node: &str, nodes: &[RebootedNode]) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str("The following nodes installed updates that require a reboot:\n");
    for entry in nodes {
        out.push_str(&format!("    - {}", entry.node));
        if entry.node == control_node {
            out.push_str(" (control node)");
        }
        if !entry.reason.is_empty() {
            out.push_str(&format!(": {}", entry.reason));
        }
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&format!(
        "Please reboot the nodes above, then re-run the stage: {stage}\n"
    ));
    out
}
