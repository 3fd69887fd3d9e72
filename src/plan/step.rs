// src/plan/step.rs

use serde::Deserialize;

use crate::errors::{Result, StagehandError};

/// One expected step of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlannedStep {
    /// Stable identifier: the state name for state applications, the
    /// function name for module/runner invocations.
    pub id: String,
    /// Human label shown by the printers.
    #[serde(default)]
    pub label: String,
    /// True for steps only discoverable at runtime.
    #[serde(default)]
    pub dynamic: bool,
}

impl PlannedStep {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            dynamic: false,
        }
    }

    /// A step synthesized at runtime for an identifier absent from the
    /// static plan.
    pub fn synthesized(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            dynamic: true,
        }
    }
}

/// Ordered sequence of planned steps for one stage run.
///
/// Statically rendered step identifiers are unique; synthesized steps
/// inserted during a run are exempt from that check.
#[derive(Debug, Clone, Default)]
pub struct StepPlan {
    steps: Vec<PlannedStep>,
}

impl StepPlan {
    pub fn from_steps(steps: Vec<PlannedStep>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.as_str()) {
                return Err(StagehandError::ConfigError(format!(
                    "duplicate step id in rendered plan: {}",
                    step.id
                )));
            }
        }
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PlannedStep> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> impl Iterator<Item = &PlannedStep> {
        self.steps.iter()
    }

    /// Insert a synthesized step at `index` (clamped to the plan end).
    pub fn insert(&mut self, index: usize, step: PlannedStep) {
        let index = index.min(self.steps.len());
        self.steps.insert(index, step);
    }
}
