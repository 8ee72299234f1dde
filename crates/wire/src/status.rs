// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wire-level error taxonomy (§7) and its mapping onto `mm_core::StatusCode`.

use mm_core::{MmError, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    SessionId,
    Address,
    Cycle,
    Rollback,
    Checkin,
    SessionKill,
    NotReady,
    ShuttingDown,
    Unknown,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::SessionId | ErrorKind::Address | ErrorKind::Cycle | ErrorKind::Rollback => {
                StatusCode::InvalidArgument
            }
            ErrorKind::ShuttingDown => StatusCode::Unavailable,
            ErrorKind::Checkin
            | ErrorKind::SessionKill
            | ErrorKind::NotReady
            | ErrorKind::Unknown => StatusCode::Unknown,
        }
    }
}

impl From<&MmError> for ErrorKind {
    fn from(err: &MmError) -> Self {
        match err {
            MmError::UnknownSession(_) | MmError::SessionIdInUse(_) => ErrorKind::SessionId,
            MmError::Address { .. } => ErrorKind::Address,
            MmError::Cycle { .. } => ErrorKind::Cycle,
            MmError::Rollback(_) => ErrorKind::Rollback,
            MmError::Checkin(_) => ErrorKind::Checkin,
            MmError::SessionKill(_) => ErrorKind::SessionKill,
            MmError::NotReady(_) => ErrorKind::NotReady,
            MmError::ShuttingDown => ErrorKind::ShuttingDown,
            MmError::Other(_) => ErrorKind::Unknown,
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
