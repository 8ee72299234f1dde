// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured logging setup (§10.3).
//!
//! Every RPC entry/exit, cycle-seek decision, check-in, and lifecycle
//! transition already emits a `tracing` event with `session_id` as a field
//! from within the registry and dispatcher; this module only wires up the
//! one global subscriber those events flow through.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber: an `EnvFilter` sourced from
/// `RUST_LOG` (default `info`) feeding a `fmt` layer. Call once, before the
/// listener accepts its first connection. Logging is ambient infrastructure,
/// not a feature named in any Non-goal, so it is present unconditionally.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}
