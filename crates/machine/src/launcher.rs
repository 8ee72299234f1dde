// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WorkerLauncher`: spawns and hard-kills worker subprocesses.
//!
//! The coordinator does not wait on the spawned child; it waits on check-in
//! instead (see `CheckinService`). `kill_all` is a pattern-match process
//! termination, the same fallback the Lifecycle coordinator and the
//! check-in-timeout cleanup path both reach for when a clean worker
//! shutdown RPC is unavailable.

use async_trait::async_trait;
use mm_core::SessionId;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LaunchError {
    #[error("failed to spawn worker for session {session}: {reason}")]
    SpawnFailed { session: String, reason: String },
}

#[async_trait]
pub trait WorkerLauncher: Send + Sync + 'static {
    /// Spawn a worker subprocess for `session_id`, passing it the
    /// coordinator's check-in listening address. Returns once the process
    /// has been launched, not once it has checked in.
    async fn spawn(&self, session_id: &SessionId, checkin_addr: &str) -> Result<(), LaunchError>;

    /// Hard-kill any subprocess whose command line embeds `session_id`.
    /// Best-effort: failures are logged, never propagated, since callers
    /// use this as a last-resort cleanup after a clean shutdown RPC failed
    /// or after a check-in timeout.
    async fn kill_all(&self, session_id: &SessionId);
}

/// Production launcher: spawns the configured worker binary and hard-kills
/// via `pkill -f` on the session id, mirroring how the process table is the
/// only place a session id still shows up once the worker forgets its own
/// bookkeeping.
pub struct ProcessWorkerLauncher {
    /// Path (or bare name, if on `$PATH`) of the worker binary to spawn.
    binary: String,
    /// Extra arguments prepended before `--session-id <id> --checkin-address <addr>`.
    extra_args: Vec<String>,
}

impl ProcessWorkerLauncher {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into(), extra_args: Vec::new() }
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

#[async_trait]
impl WorkerLauncher for ProcessWorkerLauncher {
    async fn spawn(&self, session_id: &SessionId, checkin_addr: &str) -> Result<(), LaunchError> {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args(&self.extra_args)
            .arg("--session-id")
            .arg(session_id.as_str())
            .arg("--checkin-address")
            .arg(checkin_addr)
            .kill_on_drop(false);

        cmd.spawn().map(|_child| ()).map_err(|e| LaunchError::SpawnFailed {
            session: session_id.to_string(),
            reason: e.to_string(),
        })
    }

    async fn kill_all(&self, session_id: &SessionId) {
        let pattern = format!("{}.*{}", self.binary, session_id.as_str());
        let result = tokio::process::Command::new("pkill").args(["-f", &pattern]).output().await;
        if let Err(e) = result {
            warn!(session_id = %session_id, error = %e, "pkill invocation failed");
        }
    }
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
