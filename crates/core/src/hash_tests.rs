// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn from_bytes_formats_lowercase_hex() {
    let hash = MachineHash::from_bytes(&[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(hash.as_str(), "deadbeef");
}

#[test]
fn equality_is_by_value() {
    let a = MachineHash::from_hex("abc123");
    let b = MachineHash::from_hex("abc123");
    let c = MachineHash::from_hex("def456");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn serde_roundtrips_as_bare_string() {
    let hash = MachineHash::from_hex("cafef00d");
    let json = serde_json::to_string(&hash).unwrap();
    assert_eq!(json, "\"cafef00d\"");
    let parsed: MachineHash = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, hash);
}
