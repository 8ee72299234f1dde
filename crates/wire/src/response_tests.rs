// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn not_ready_round_trips_through_json() {
    let response = Response::NotReady { message: "job still running".to_string() };
    let json = serde_json::to_string(&response).unwrap();
    let parsed: Response = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, response);
}

#[test]
fn error_round_trips_through_json() {
    let response =
        Response::Error { kind: ErrorKind::Checkin, message: "timed out".to_string() };
    let json = serde_json::to_string(&response).unwrap();
    let parsed: Response = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, response);
}
