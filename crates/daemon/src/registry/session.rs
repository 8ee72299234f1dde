// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session state and the check-in rendezvous primitive.
//!
//! `SessionHandle` is the Rust shape of §3's Session: a `session_lock`
//! (held across worker RPCs and check-in waits, hence `tokio::sync::Mutex`
//! rather than `parking_lot`), a `parking_lot::Mutex` over the small fields
//! the registry's global lock and the session lock both touch briefly, and
//! a `tokio::sync::Notify` standing in for `checkin_lock` + `checkin_cond`.

use std::time::Duration;

use mm_core::{MachineHash, MachineRequest, SessionId, WorkerAddress};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// How long the registry blocks waiting for a worker to check in after a
/// spawn, snapshot, or rollback.
pub const CHECKIN_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// The mutable fields of a session, guarded by `SessionHandle::state`.
///
/// `updated_at` is a read-model timestamp only — diagnostics consult it,
/// control flow never does, so it can't become a second source of truth
/// for `cycle`.
#[derive(Debug, Clone)]
pub struct SessionFields {
    pub address: Option<WorkerAddress>,
    pub cycle: u64,
    pub snapshot_cycle: Option<u64>,
    pub updated_at_ms: u64,
}

/// A snapshot of session state for introspection. Never consulted by the
/// registry's own control flow.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub cycle: u64,
    pub snapshot_cycle: Option<u64>,
    pub has_address: bool,
    pub updated_at_ms: u64,
}

pub struct SessionHandle {
    pub session_id: SessionId,
    /// Immutable after creation (invariant 4): replayed verbatim on recreate.
    pub creation_machine_req: MachineRequest,
    pub state: Mutex<SessionFields>,
    /// Serializes every machine-mutating operation on this session; held
    /// across worker RPCs and check-in waits.
    pub session_lock: tokio::sync::Mutex<()>,
    /// Signaled whenever `state.address` transitions from `None` to `Some`.
    checkin_notify: Notify,
}

impl SessionHandle {
    pub fn new(session_id: SessionId, creation_machine_req: MachineRequest, now_ms: u64) -> Self {
        Self {
            session_id,
            creation_machine_req,
            state: Mutex::new(SessionFields {
                address: None,
                cycle: 0,
                snapshot_cycle: None,
                updated_at_ms: now_ms,
            }),
            session_lock: tokio::sync::Mutex::new(()),
            checkin_notify: Notify::new(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        let fields = self.state.lock();
        SessionStatus {
            session_id: self.session_id.clone(),
            cycle: fields.cycle,
            snapshot_cycle: fields.snapshot_cycle,
            has_address: fields.address.is_some(),
            updated_at_ms: fields.updated_at_ms,
        }
    }

    /// Clear the address, marking a worker creation/snapshot/rollback as
    /// in flight. Does not touch `cycle` or `snapshot_cycle`.
    pub fn clear_address(&self, now_ms: u64) {
        let mut fields = self.state.lock();
        fields.address = None;
        fields.updated_at_ms = now_ms;
    }

    /// Record a freshly-announced address and wake every waiter. Called by
    /// `SessionRegistry::checkin` — the only writer of `address: Some(..)`.
    pub fn record_checkin(&self, address: WorkerAddress, now_ms: u64) {
        let mut fields = self.state.lock();
        fields.address = Some(address);
        fields.updated_at_ms = now_ms;
        drop(fields);
        self.checkin_notify.notify_one();
    }

    /// Block until `state.address` is set, bounded by `CHECKIN_WAIT_TIMEOUT`.
    ///
    /// The predicate is checked *before* every wait, not just once, so a
    /// check-in that arrives before this call starts waiting (or between a
    /// notify and our re-check) is never missed — the condition-variable
    /// predicate is "address is set", not "someone signaled".
    pub async fn await_checkin(&self) -> Option<WorkerAddress> {
        let wait = async {
            loop {
                if let Some(addr) = self.state.lock().address.clone() {
                    return addr;
                }
                self.checkin_notify.notified().await;
            }
        };
        tokio::time::timeout(CHECKIN_WAIT_TIMEOUT, wait).await.ok()
    }

    pub fn current_address(&self) -> Option<WorkerAddress> {
        self.state.lock().address.clone()
    }

    pub fn cycle(&self) -> u64 {
        self.state.lock().cycle
    }

    pub fn snapshot_cycle(&self) -> Option<u64> {
        self.state.lock().snapshot_cycle
    }
}

/// `NewSession`'s initial hash, paired with nothing else — kept separate
/// from `SessionFields` since it's a one-time return value, not state.
pub type InitialHash = MachineHash;
