// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `stagehand`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stagehand",
    version,
    about = "Run cluster deployment stages and monitor their progress.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `/etc/stagehand/config.toml`.
    #[arg(long, value_name = "PATH", default_value = "/etc/stagehand/config.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STAGEHAND_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Stage operations.
    #[command(subcommand)]
    Stage(StageCommand),
}

#[derive(Debug, Clone, Subcommand)]
pub enum StageCommand {
    /// Run a stage and stream its progress to the terminal.
    Run {
        /// Name of the stage to run (e.g. `cluster.stage.2`).
        #[arg(value_name = "STAGE")]
        stage: String,

        /// Use the minimal one-line-per-event outputter.
        #[arg(long)]
        simple: bool,

        /// Don't show progress for statically planned steps.
        #[arg(long = "no-state-steps")]
        no_state_steps: bool,

        /// Don't show steps generated dynamically at runtime.
        #[arg(long = "no-dynamic-steps")]
        no_dynamic_steps: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
