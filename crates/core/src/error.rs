// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator error taxonomy and its mapping to RPC-style status codes.

use crate::session_id::SessionId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RPC-style status code a `MmError` maps onto at the wire boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    InvalidArgument,
    Unavailable,
    Unknown,
}

/// Coordinator-level errors, distinct from transport or I/O failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MmError {
    #[error("unknown session id: {0}")]
    UnknownSession(SessionId),

    #[error("session id already in use: {0}")]
    SessionIdInUse(SessionId),

    #[error("address error for session {session}: {reason}")]
    Address { session: SessionId, reason: String },

    #[error("bad cycle list for session {session}: {reason}")]
    Cycle { session: SessionId, reason: String },

    #[error("rollback requested with no snapshot for session {0}")]
    Rollback(SessionId),

    #[error("worker for session {0} failed to check in within the timeout")]
    Checkin(SessionId),

    #[error("failed to terminate subprocess(es) for session {0}")]
    SessionKill(SessionId),

    #[error("not ready: {0}")]
    NotReady(String),

    #[error("coordinator is shutting down")]
    ShuttingDown,

    #[error("{0}")]
    Other(String),
}

impl MmError {
    pub fn status(&self) -> StatusCode {
        match self {
            MmError::UnknownSession(_)
            | MmError::SessionIdInUse(_)
            | MmError::Address { .. }
            | MmError::Cycle { .. }
            | MmError::Rollback(_) => StatusCode::InvalidArgument,
            MmError::ShuttingDown => StatusCode::Unavailable,
            MmError::Checkin(_)
            | MmError::SessionKill(_)
            | MmError::NotReady(_)
            | MmError::Other(_) => StatusCode::Unknown,
        }
    }
}

pub type MmResult<T> = Result<T, MmError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
