// src/plan/render.rs

//! Static stage rendering through the framework's renderer.
//!
//! `<orch_cmd> render <stage> --format json` prints either a step list
//! or a structured error object naming the offending states or the
//! offending stage file. Rendering is deterministic for a fixed stage
//! definition and has no side effects beyond reading the config store.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{Result, StagehandError};

use super::step::{PlannedStep, StepPlan};

/// Trait abstracting how a stage is rendered into a step plan.
///
/// Production code uses [`CommandRenderer`]; tests can provide an
/// implementation returning a canned plan or error.
pub trait StageRenderer: Send + Sync {
    fn render(
        &self,
        stage: &str,
    ) -> Pin<Box<dyn Future<Output = Result<StepPlan>> + Send + '_>>;
}

/// Production renderer: shells out to the framework renderer.
pub struct CommandRenderer {
    orch_cmd: String,
}

impl CommandRenderer {
    pub fn new(orch_cmd: impl Into<String>) -> Self {
        Self { orch_cmd: orch_cmd.into() }
    }
}

#[derive(Debug, Deserialize)]
struct RenderOutput {
    steps: Vec<PlannedStep>,
}

#[derive(Debug, Deserialize)]
struct RenderErrorOutput {
    error: String,
    #[serde(default)]
    states: Vec<String>,
    #[serde(default)]
    stage_file: Option<PathBuf>,
    #[serde(default)]
    description: String,
}

impl StageRenderer for CommandRenderer {
    fn render(
        &self,
        stage: &str,
    ) -> Pin<Box<dyn Future<Output = Result<StepPlan>> + Send + '_>> {
        let cmd = self.orch_cmd.clone();
        let stage = stage.to_string();

        Box::pin(async move {
            info!(%stage, "rendering stage");
            let output = Command::new(&cmd)
                .args(["render", &stage, "--format", "json"])
                .output()
                .await
                .map_err(|e| {
                    StagehandError::ConfigError(format!("cannot invoke renderer '{cmd}': {e}"))
                })?;

            let stdout = String::from_utf8_lossy(&output.stdout);
            if output.status.success() {
                let rendered: RenderOutput = serde_json::from_str(&stdout).map_err(|e| {
                    StagehandError::ConfigError(format!("unexpected renderer output: {e}"))
                })?;
                debug!(steps = rendered.steps.len(), "stage rendered");
                return StepPlan::from_steps(rendered.steps);
            }

            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stdout.trim().is_empty() { &stderr } else { &stdout };
            Err(rendering_error(&stage, detail))
        })
    }
}

/// Map renderer failure output onto the two rendering-error kinds.
fn rendering_error(stage: &str, detail: &str) -> StagehandError {
    if let Ok(parsed) = serde_json::from_str::<RenderErrorOutput>(detail.trim()) {
        if parsed.error == "states" && !parsed.states.is_empty() {
            return StagehandError::StateRendering {
                states: parsed.states,
                description: parsed.description,
            };
        }
        return StagehandError::StageRendering {
            stage_file: parsed.stage_file.unwrap_or_else(|| stage_file_path(stage)),
            description: parsed.description,
        };
    }
    StagehandError::StageRendering {
        stage_file: stage_file_path(stage),
        description: detail.trim().to_string(),
    }
}

/// Conventional on-disk location of a stage definition.
pub fn stage_file_path(stage: &str) -> PathBuf {
    PathBuf::from(format!("/srv/orch/{}.sls", stage.replace('.', "/")))
}
