// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! snip-core: Shared library for snippet synchronization
//!
//! This crate provides the snippet data model, update actions, the pure
//! reconciliation logic and the clock primitives used by the sync engine.

pub mod action;
pub mod clock;
pub mod error;
pub mod jsonl;
pub mod outcome;
pub mod protocol;
pub mod reconcile;
pub mod snippet;

pub use action::{ActionKind, SnippetField, SnippetPatch, UpdateAction};
pub use clock::{ClockOffset, ClockSource, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use outcome::Outcome;
pub use protocol::ServerMessage;
pub use snippet::{DynamicResource, Props, ResourceKind, Snippet, TemplateEngine};
