// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! snipsync - keeps a client-side snippet list in sync with its backend.
//!
//! An engine combines an HTTP snapshot, a real-time update channel, local
//! expiry of time-boxed snippets, a disk cache for warm starts and
//! caller-supplied property overrides into one stream of
//! [`Outcome`](snip_core::Outcome)s.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//! │ SnapshotCache│  │ SnippetLoader│  │   Realtime   │  │  Visibility  │
//! │  (warm start)│  │    (HTTP)    │  │   Channel    │  │  Scheduler   │
//! └──────┬───────┘  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘
//!        └─────────────────┴────────┬────────┴─────────────────┘
//!                                   ▼
//!                          ┌─────────────────┐
//!                          │  Orchestrator   │  single task, owns the list
//!                          │  (reconcile)    │
//!                          └────────┬────────┘
//!                                   ▼
//!                         Subscription::next()
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use snipsync::{Configuration, SyncBuilder};
//!
//! let sync = SyncBuilder::new(Configuration::project("acme", "web")).build()?;
//! sync.register()?;
//!
//! let mut outcomes = sync.outcomes();
//! while let Some(outcome) = outcomes.next().await {
//!     println!("{:?}", outcome.data());
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod connectivity;
pub mod error;
mod handle;
pub mod loader;
mod orchestrator;
mod registry;
pub mod sync;

#[cfg(test)]
mod test_helpers;

pub use cache::{FileSnapshotCache, MemorySnapshotCache, SnapshotCache};
pub use config::{Configuration, EngineConfig};
pub use connectivity::{Connectivity, ConnectivityMonitor, ManualConnectivity};
pub use error::{Error, Result};
pub use handle::{SnippetSync, Subscription, SyncBuilder};
pub use loader::{HttpSnippetLoader, ProjectResult, SnippetLoader};
pub use orchestrator::SyncOutcome;
pub use registry::SyncRegistry;
