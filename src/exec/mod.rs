// src/exec/mod.rs

//! Stage execution layer.
//!
//! Runs the orchestration as an isolated child process via
//! `tokio::process::Command`, with stdout/stderr redirected away from
//! the terminal: progress and failures surface through the event
//! monitor, not through the child's own output.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::errors::{Result, StagehandError};

#[derive(Debug)]
struct ExecutorShared {
    pid: Mutex<Option<u32>>,
    running: AtomicBool,
}

impl ExecutorShared {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Deliver SIGINT to the child if it is currently running; a no-op
    /// otherwise. Never fails: a process that exited in the meantime
    /// simply ignores us.
    fn interrupt(&self) {
        if !self.is_running() {
            debug!("interrupt requested but stage process is not running");
            return;
        }
        let pid = self.pid.lock().unwrap();
        if let Some(pid) = *pid {
            info!(pid, "sending SIGINT to stage process");
            // The child handle is still owned, so the pid has not been
            // reused.
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
            if rc != 0 {
                warn!(pid, "failed to signal stage process");
            }
        }
    }
}

/// Cloneable handle for interrupting the executor from other tasks
/// (the cancellation-signal handler).
#[derive(Debug, Clone)]
pub struct ExecutorHandle {
    shared: Arc<ExecutorShared>,
}

impl ExecutorHandle {
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    pub fn interrupt(&self) {
        self.shared.interrupt();
    }
}

/// Executes one stage in a child process.
pub struct StageExecutor {
    orch_cmd: String,
    stage: String,
    shared: Arc<ExecutorShared>,
    child: Option<Child>,
}

impl StageExecutor {
    pub fn new(orch_cmd: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            orch_cmd: orch_cmd.into(),
            stage: stage.into(),
            shared: Arc::new(ExecutorShared {
                pid: Mutex::new(None),
                running: AtomicBool::new(false),
            }),
            child: None,
        }
    }

    pub fn handle(&self) -> ExecutorHandle {
        ExecutorHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Spawn the orchestration process.
    pub fn start(&mut self) -> Result<()> {
        info!(stage = %self.stage, cmd = %self.orch_cmd, "starting stage process");
        let child = Command::new(&self.orch_cmd)
            .args(["run", &self.stage])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawning '{} run {}'", self.orch_cmd, self.stage))
            .map_err(StagehandError::Other)?;

        *self.shared.pid.lock().unwrap() = child.id();
        self.shared.running.store(true, Ordering::SeqCst);
        self.child = Some(child);
        Ok(())
    }

    /// True iff the process was started and has not yet exited.
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Graceful cancellation: SIGINT to the running child, no-op
    /// otherwise.
    pub fn interrupt(&self) {
        self.shared.interrupt();
    }

    /// Wait for the process to exit and return its exit code verbatim.
    /// A nonzero exit is not an error here; the code is simply
    /// propagated.
    pub async fn join(&mut self) -> Result<i32> {
        let Some(mut child) = self.child.take() else {
            return Err(StagehandError::ConfigError(
                "stage executor was never started".to_string(),
            ));
        };

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for '{}'", self.orch_cmd))
            .map_err(StagehandError::Other)?;

        self.shared.running.store(false, Ordering::SeqCst);
        *self.shared.pid.lock().unwrap() = None;

        let code = status.code().unwrap_or(-1);
        info!(stage = %self.stage, exit_code = code, "stage process exited");
        Ok(code)
    }
}
