// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Settings for `stagehand`, loaded from `/etc/stagehand/config.toml`.
///
/// All fields have defaults so a missing config file still yields a
/// usable configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Command used to drive the remote-execution framework, both for
    /// static stage rendering (`<orch_cmd> render <stage>`) and for
    /// running the orchestration itself (`<orch_cmd> run <stage>`).
    pub orch_cmd: String,

    /// Unix socket the framework publishes execution events on.
    pub event_socket: PathBuf,

    /// Pillar file holding fleet-wide data (control node identity,
    /// operator run options).
    pub pillar_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            orch_cmd: "orch-run".to_string(),
            event_socket: PathBuf::from("/var/run/orch/events.sock"),
            pillar_path: PathBuf::from("/srv/pillar/cluster/stagehand.toml"),
        }
    }
}
