// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection status shared between the channel task and its owner.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Lifecycle of the real-time connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Idle = 0,
    Connecting = 1,
    Open = 2,
    Closing = 3,
    Closed = 4,
    Failed = 5,
    /// Refused with 403; the address is not dialed again.
    Forbidden = 6,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Open,
            3 => ConnectionState::Closing,
            4 => ConnectionState::Closed,
            5 => ConnectionState::Failed,
            6 => ConnectionState::Forbidden,
            _ => ConnectionState::Idle,
        }
    }
}

/// Status transitions reported by the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Open,
    Closed,
    /// Failure with the reported status code, if the transport gave one.
    Failed(Option<u16>),
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Open => write!(f, "open"),
            ConnectionStatus::Closed => write!(f, "closed"),
            ConnectionStatus::Failed(Some(code)) => write!(f, "failed ({code})"),
            ConnectionStatus::Failed(None) => write!(f, "failed"),
        }
    }
}

/// Connection state visible to both the background task and the owner.
///
/// Uses atomic fields for lock-free reads.
pub struct SharedConnectionState {
    state: AtomicU8,
    /// Consecutive failed attempts since the last successful open.
    failures: AtomicU32,
}

impl SharedConnectionState {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::Idle as u8),
            failures: AtomicU32::new(0),
        }
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::Acquire)
    }

    /// Records a failed attempt and returns the new consecutive count.
    pub fn record_failure(&self) -> u32 {
        self.failures.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }

    pub fn reset_failures(&self) {
        self.failures.store(0, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.get() == ConnectionState::Open
    }

    /// Human-readable status for logs and the CLI.
    pub fn status_string(&self) -> String {
        match self.get() {
            ConnectionState::Idle => "idle".to_string(),
            ConnectionState::Connecting => {
                let failures = self.failures();
                if failures > 0 {
                    format!("connecting (after {} failures)", failures)
                } else {
                    "connecting".to_string()
                }
            }
            ConnectionState::Open => "open".to_string(),
            ConnectionState::Closing => "closing".to_string(),
            ConnectionState::Closed => "closed".to_string(),
            ConnectionState::Failed => "failed".to_string(),
            ConnectionState::Forbidden => "forbidden".to_string(),
        }
    }
}

impl Default for SharedConnectionState {
    fn default() -> Self {
        Self::new()
    }
}
