// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merkle proof of a memory region against the machine's state root.

use crate::hash::MachineHash;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub target_address: u64,
    pub log2_size: u32,
    /// Sibling hashes from the target up to the root, innermost first.
    pub sibling_hashes: Vec<MachineHash>,
    pub root_hash: MachineHash,
}
