// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Analyzer subprocess execution.
//!
//! One run: spawn the analyzer under a shell shim in its working
//! directory, write the input document to stdin, drain stdout and
//! stderr fully, wait for exit. Stdin writing and output draining are
//! concurrent so the child cannot deadlock on a full pipe.
//!
//! Concurrency is capped by a semaphore sized from configuration; the
//! permit is held for the whole run so a slow analyzer occupies exactly
//! one pool slot.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Semaphore;

/// Errors from one analyzer run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("io error talking to analyzer: {0}")]
    Io(#[from] std::io::Error),
    #[error("timeout")]
    Timeout,
    #[error("runner pool closed")]
    PoolClosed,
}

/// Captured result of one analyzer run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Process exit code; `None` when terminated by a signal. Recorded
    /// but not interpreted — correctness comes from the output document.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs analyzer subprocesses on a bounded pool.
#[derive(Clone)]
pub struct ProcessRunner {
    pool: Arc<Semaphore>,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(pool_size: usize, timeout: Option<Duration>) -> Self {
        Self {
            pool: Arc::new(Semaphore::new(pool_size.max(1))),
            timeout,
        }
    }

    /// Number of currently free pool slots.
    pub fn available_slots(&self) -> usize {
        self.pool.available_permits()
    }

    /// Run one analyzer to completion and capture its output.
    ///
    /// The command path is wrapped by a shell (`sh -c`, `cmd /c` on
    /// Windows) so analyzers may be scripts; paths must not contain
    /// shell-active characters.
    pub async fn run(&self, cmd: &Path, cwd: &Path, input: &str) -> Result<RunOutput, RunError> {
        let _permit = self
            .pool
            .acquire()
            .await
            .map_err(|_| RunError::PoolClosed)?;

        let cmd_str = cmd.display().to_string();
        let mut command = shell_command(&cmd_str);
        command
            .current_dir(cwd)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            // Dropping the wait future (timeout) must not leak the child.
            .kill_on_drop(true);

        tracing::debug!(command = %cmd_str, cwd = %cwd.display(), "spawning analyzer");

        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            command: cmd_str.clone(),
            source,
        })?;

        // Feed stdin from a separate task while wait_with_output drains
        // stdout and stderr concurrently.
        if let Some(mut stdin) = child.stdin.take() {
            let bytes = input.as_bytes().to_vec();
            tokio::spawn(async move {
                let _ = stdin.write_all(&bytes).await;
                let _ = stdin.shutdown().await;
            });
        }

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_elapsed| {
                    tracing::warn!(command = %cmd_str, timeout_s = limit.as_secs(), "analyzer timed out");
                    RunError::Timeout
                })??,
            None => child.wait_with_output().await?,
        };

        let run = RunOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(
            command = %cmd_str,
            exit_code = ?run.exit_code,
            stdout_bytes = run.stdout.len(),
            stderr_bytes = run.stderr.len(),
            "analyzer finished"
        );
        Ok(run)
    }
}

#[cfg(not(windows))]
fn shell_command(cmd: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(cmd);
    command
}

#[cfg(windows)]
fn shell_command(cmd: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/c").arg(cmd);
    command
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
