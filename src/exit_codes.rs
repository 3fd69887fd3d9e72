// src/exit_codes.rs

//! Stable exit codes for the `stagehand` CLI.
//!
//! A stage run that fails because one of its steps failed exits with the
//! orchestration process's own exit code, not one of these.

/// The stage ran to completion and the orchestration process exited 0.
pub const OK: i32 = 0;
/// The stage failed static rendering; no process was launched.
pub const RENDERING_ERROR: i32 = 2;
/// One or more nodes require a reboot before the stage can continue.
pub const REBOOT_REQUIRED: i32 = 100;
