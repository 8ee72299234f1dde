// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker check-in address.
//!
//! The endpoint a freshly spawned (or post-snapshot/rollback) worker reports
//! to the coordinator once it is ready to accept `MachineClient` calls.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerAddress(String);

impl WorkerAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WorkerAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkerAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
