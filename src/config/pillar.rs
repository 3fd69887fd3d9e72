// src/config/pillar.rs

//! Narrow interface onto the fleet pillar file.
//!
//! The pillar is owned by the remote-execution framework; stagehand only
//! performs read lookups plus write-once-if-absent persistence of the
//! run options the orchestration states consult (e.g. `auto_reboot`).
//! An operator-set value is never overwritten.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{Result, StagehandError};
use crate::fs::FileSystem;

pub struct PillarStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl PillarStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self { fs, path: path.into() }
    }

    /// Look up a single pillar key.
    ///
    /// Returns `None` both for a missing key and for a missing pillar
    /// file.
    pub fn get(&self, key: &str) -> Result<Option<toml::Value>> {
        if !self.fs.exists(&self.path) {
            return Ok(None);
        }
        let contents = self.fs.read_to_string(&self.path).map_err(StagehandError::Other)?;
        let table: toml::Table = toml::from_str(&contents)?;
        Ok(table.get(key).cloned())
    }

    /// Identity of the control node the orchestration runs from.
    pub fn control_node(&self) -> Result<String> {
        match self.get("control_node")? {
            Some(toml::Value::String(s)) if !s.is_empty() => Ok(s),
            Some(other) => Err(StagehandError::ConfigError(format!(
                "pillar key 'control_node' has unexpected value: {other}"
            ))),
            None => Err(StagehandError::ConfigError(format!(
                "pillar key 'control_node' not set in {}",
                self.path.display()
            ))),
        }
    }

    /// Persist `key = value` unless the key already has a value.
    ///
    /// Returns true if the key was written.
    pub fn set_if_absent(&self, key: &str, value: toml::Value) -> Result<bool> {
        if let Some(existing) = self.get(key)? {
            debug!(key, %existing, "pillar key already set, leaving untouched");
            return Ok(false);
        }
        let line = format!("{key} = {value}\n");
        self.fs
            .append(&self.path, line.as_bytes())
            .map_err(StagehandError::Other)?;
        debug!(key, "pillar key written");
        Ok(true)
    }
}
