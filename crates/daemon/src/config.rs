// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI configuration surface (§6 / §10.4): the three flags the distilled
//! spec names, plus the worker binary path `ProcessWorkerLauncher` needs to
//! have anything to spawn. No environment-variable layer beyond `RUST_LOG`
//! is introduced — logging is the one ambient concern that is universally
//! configured that way across this corpus, not a coordinator-specific knob.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "mmd", about = "Machine coordination server", version)]
pub struct Config {
    /// Bind address for the client/worker RPC listener.
    #[arg(short = 'a', long = "address", default_value = "localhost")]
    pub address: String,

    /// Bind port for the client/worker RPC listener.
    #[arg(short = 'p', long = "port", default_value_t = 50051)]
    pub port: u16,

    /// Swap in a fault-injecting registry for testing (§9). Never set in
    /// production.
    #[arg(short = 'd', long = "defective")]
    pub defective: bool,

    /// Worker subprocess binary spawned for each session. Not part of the
    /// distilled CLI surface, but `ProcessWorkerLauncher` has no other way
    /// to know what to exec.
    #[arg(long = "worker-bin", default_value = "mm-worker")]
    pub worker_bin: String,
}

impl Config {
    /// The `host:port` string both bound by the TCP listener and handed to
    /// every spawned worker as its check-in address — client traffic and
    /// worker check-ins share one listener (§10.1).
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
