// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    network = { Error::Network("connection refused".into()), "connection refused" },
    http = { Error::Http { status: 503, url: "https://api/x".into() }, "status 503" },
    auth = { Error::Auth, "credentials" },
    forbidden = { Error::Forbidden, "forbidden" },
    decode = { Error::Decode("eof".into()), "malformed payload: eof" },
    closed = { Error::Closed, "no longer running" },
)]
fn error_display_contains(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected));
}

#[parameterized(
    network = { Error::Network("x".into()), true },
    http = { Error::Http { status: 500, url: String::new() }, true },
    auth = { Error::Auth, false },
    forbidden = { Error::Forbidden, false },
    decode = { Error::Decode("x".into()), false },
)]
fn recoverable(err: Error, expected: bool) {
    assert_eq!(err.is_recoverable(), expected);
}

#[test]
fn core_error_is_transparent() {
    let err: Error = snip_core::Error::Decode("bad frame".into()).into();
    assert_eq!(err.to_string(), "malformed message: bad frame");
}

#[test]
fn channel_failure_classification() {
    assert!(matches!(Error::from_channel_failure(Some(401)), Error::Auth));
    assert!(matches!(Error::from_channel_failure(Some(403)), Error::Forbidden));
    assert_eq!(
        Error::from_channel_failure(Some(500)).to_string(),
        "network error: channel failed with code 500"
    );
    assert_eq!(
        Error::from_channel_failure(None).to_string(),
        "network error: channel connection lost"
    );
}
