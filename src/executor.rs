// SPF Safe Shell - Command Executor
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Runs one external program with a literal argument vector. Never a shell:
// arguments go straight to execve, so metacharacters are inert.
// No policy logic lives here.
//
// Lifecycle: the child is owned by a guard whose Drop kills and reaps it,
// so every exit path (timeout, cancel, wait error, panic) releases it.
// stdout/stderr are drained on their own threads so a chatty child can
// never block on a full pipe.

use crate::error::{GateError, Result};
use crate::policy::Invocation;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of a process that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Cooperative cancellation flag shared between transport and executor.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs a validated invocation. Implemented by the real process runner
/// and by test doubles.
pub trait Runner: Send + Sync {
    fn run(&self, invocation: &Invocation, cancel: &CancelToken) -> Result<ExecutionResult>;
}

// ============================================================================
// PROCESS GUARD
// ============================================================================

struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self { child, reaped: false }
    }

    fn terminate(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
            self.reaped = true;
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.code().or_else(|| status.signal().map(|s| 128 + s)).unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

// ============================================================================
// SYSTEM RUNNER
// ============================================================================

/// Spawns real processes with a bounded wait.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
    working_dir: Option<PathBuf>,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, working_dir: None }
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Runner for SystemRunner {
    fn run(&self, invocation: &Invocation, cancel: &CancelToken) -> Result<ExecutionResult> {
        let command = invocation.program.clone();

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| GateError::LaunchFailure {
            command: command.clone(),
            reason: e.to_string(),
        })?;
        let mut guard = ChildGuard::new(child);
        log::debug!("spawned {} (pid {})", command, guard.child.id());

        let stdout = guard.child.stdout.take().map(drain);
        let stderr = guard.child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match guard.child.try_wait() {
                Ok(Some(status)) => {
                    guard.reaped = true;
                    break status;
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(GateError::LaunchFailure {
                        command,
                        reason: format!("wait failed: {}", e),
                    });
                }
            }

            // Killed children close their pipes; reader threads finish on
            // their own and are not joined here, so a stray grandchild
            // holding a pipe cannot stall the response.
            if cancel.is_cancelled() {
                guard.terminate();
                log::info!("cancelled {}", command);
                return Err(GateError::Cancelled { command });
            }
            if Instant::now() >= deadline {
                guard.terminate();
                log::warn!("timeout after {:?}: {}", self.timeout, command);
                return Err(GateError::Timeout { command, timeout_secs: self.timeout.as_secs() });
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(ExecutionResult {
            exit_status: exit_code(status),
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
