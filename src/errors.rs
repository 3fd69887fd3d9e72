// src/errors.rs

//! Crate-wide error taxonomy and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StagehandError {
    /// One or more states referenced by the stage failed to render.
    #[error("failed to render states: {}", states.join(", "))]
    StateRendering {
        states: Vec<String>,
        description: String,
    },

    /// The stage file itself failed to render (malformed template,
    /// missing include).
    #[error("failed to render stage file: {}", stage_file.display())]
    StageRendering {
        stage_file: PathBuf,
        description: String,
    },

    /// A bus event was missing required payload fields. Per-event,
    /// logged and skipped by the consumer, never fatal.
    #[error("cannot decode event '{tag}': {reason}")]
    EventDecode { tag: String, reason: String },

    /// The connection to the event bus was lost. Fatal to the monitor
    /// task; the stage process still runs to completion.
    #[error("event bus connection lost: {0}")]
    TransportLost(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StagehandError {
    /// True for the two pre-execution rendering failure kinds.
    pub fn is_rendering(&self) -> bool {
        matches!(
            self,
            StagehandError::StateRendering { .. } | StagehandError::StageRendering { .. }
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, StagehandError>;
