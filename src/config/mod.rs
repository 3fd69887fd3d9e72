// src/config/mod.rs

//! Configuration for the tool itself and the pillar store shared with
//! the remote-execution framework.
//!
//! - [`model`] holds the typed settings deserialized from the config file.
//! - [`loader`] reads and validates the settings TOML.
//! - [`pillar`] is the narrow interface onto the fleet's pillar data:
//!   read-only lookups plus write-once-if-absent persistence of
//!   operator-supplied run options.

pub mod loader;
pub mod model;
pub mod pillar;

pub use loader::load_settings;
pub use model::Settings;
pub use pillar::PillarStore;
