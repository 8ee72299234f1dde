// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability a `WorkerLauncher` uses to deliver a simulated check-in.
//!
//! In production, a spawned worker reports its address to the coordinator
//! over the wire (`CommunicateAddress`), independent of the launcher. Tests
//! that use an in-memory launcher have no wire to send that message over, so
//! the fake launcher is handed this capability directly instead.

use async_trait::async_trait;
use mm_core::{SessionId, WorkerAddress};

#[async_trait]
pub trait CheckinSink: Send + Sync + 'static {
    async fn checkin(&self, session_id: SessionId, address: WorkerAddress);
}
