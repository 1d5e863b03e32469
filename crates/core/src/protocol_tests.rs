// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::action::ActionKind;
use crate::snippet::Snippet;
use yare::parameterized;

#[test]
fn decodes_deleted_action() {
    let msg = ServerMessage::from_json(r#"{"type":"deleted","id":"hero"}"#).unwrap();
    assert_eq!(msg, ServerMessage::Action(UpdateAction::deleted("hero")));
}

#[test]
fn decodes_updated_action_with_sparse_fields() {
    let msg = ServerMessage::from_json(
        r#"{"type":"updated","id":"hero","props":{"color":"red"},"engine":null}"#,
    )
    .unwrap();

    let action = msg.into_action().unwrap();
    assert_eq!(action.kind, ActionKind::Updated);
    assert_eq!(action.patch.props.unwrap()["color"], "red");
    assert!(action.patch.engine.is_none());
    assert!(action.patch.target.is_none());
}

#[test]
fn decodes_heartbeat_and_error() {
    assert_eq!(
        ServerMessage::from_json(r#"{"type":"heartbeat"}"#).unwrap(),
        ServerMessage::Heartbeat
    );
    assert_eq!(
        ServerMessage::from_json(r#"{"type":"error","message":"slow down"}"#).unwrap(),
        ServerMessage::Error {
            message: "slow down".into()
        }
    );
}

#[parameterized(
    not_json = { "hello" },
    no_type = { r#"{"id":"a"}"# },
    unknown_type = { r#"{"type":"moved","id":"a"}"# },
    missing_id = { r#"{"type":"deleted"}"# },
    blank_id = { r#"{"type":"deleted","id":"  "}"# },
    bad_field = { r#"{"type":"updated","id":"a","visibleUntil":"yesterday"}"# },
)]
fn malformed_frames_are_rejected(text: &str) {
    assert!(ServerMessage::from_json(text).is_err());
}

#[parameterized(
    blank_id = { r#"{"type":"deleted","id":""}"#, "deleted action without id" },
    bad_field = { r#"{"type":"updated","id":"a","visibleUntil":"soon"}"#, "invalid updated action" },
    unknown_type = { r#"{"type":"moved"}"#, "unknown message type 'moved'" },
)]
fn decode_errors_name_the_message_type(text: &str, expected: &str) {
    match ServerMessage::from_json(text) {
        Err(Error::Decode(message)) => assert!(
            message.contains(expected),
            "'{message}' should mention '{expected}'"
        ),
        other => unreachable!("expected a decode error, got {other:?}"),
    }
}

#[test]
fn created_action_survives_encoding() {
    let snippet = Snippet::new("a", "https://example.com/a");
    let msg = ServerMessage::Action(UpdateAction::created(&snippet));

    let parsed = ServerMessage::from_json(&msg.to_json().unwrap()).unwrap();

    assert_eq!(parsed, msg);
}

#[test]
fn heartbeat_encoding() {
    assert_eq!(
        ServerMessage::Heartbeat.to_json().unwrap(),
        r#"{"type":"heartbeat"}"#
    );
}
