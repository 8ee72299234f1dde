// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Memory read/write request payloads.

use serde::{Deserialize, Serialize};

/// A region to read: `length` bytes starting at `address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRange {
    pub address: u64,
    pub length: u64,
}

/// A region to write: `data` starting at `address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryWrite {
    pub address: u64,
    pub data: Vec<u8>,
}

/// A proof request target: `log2_size` identifies the granularity of the
/// Merkle subtree rooted at `address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofTarget {
    pub address: u64,
    pub log2_size: u32,
}
