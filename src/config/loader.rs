// src/config/loader.rs

use std::path::Path;

use tracing::debug;

use crate::config::model::Settings;
use crate::errors::Result;
use crate::fs::FileSystem;

/// Load settings from the given path.
///
/// A missing config file is not an error; defaults apply. A present but
/// malformed file is an error, so typos don't silently fall back to
/// defaults.
pub fn load_settings(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    if !fs.exists(path) {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Settings::default());
    }

    let contents = fs.read_to_string(path)?;
    let settings: Settings = toml::from_str(&contents)?;
    Ok(settings)
}
