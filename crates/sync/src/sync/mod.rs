// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Live update sources feeding the orchestrator.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Realtime   │────►│  Transport  │────►│   Backend   │
//! │   Channel    │◄────│   (trait)   │◄────│   Channel   │
//! └──────────────┘     └─────────────┘     └─────────────┘
//!        │ ChannelEvent
//!        ▼
//!   orchestrator ◄──── UpdateAction ──── VisibilityScheduler
//! ```
//!
//! Both sources post into unbounded queues drained by the orchestrator, so
//! neither ever touches the snippet list itself.

mod channel;
mod connection;
mod scheduler;
mod transport;

pub use channel::{ChannelEvent, RealtimeChannel, RetryPolicy, UnauthorizedCallback};
pub use connection::{ConnectionState, ConnectionStatus, SharedConnectionState};
pub use scheduler::VisibilityScheduler;
pub use transport::{
    websocket_factory, Transport, TransportError, TransportFactory, TransportResult,
    WebSocketTransport,
};
