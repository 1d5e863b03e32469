// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network reachability as an observable stream.

use std::fmt;

use tokio::sync::watch;

/// Whether the device currently has network reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Connected,
    Disconnected,
}

impl Connectivity {
    pub fn is_connected(self) -> bool {
        matches!(self, Connectivity::Connected)
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connectivity::Connected => write!(f, "connected"),
            Connectivity::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Source of connectivity changes.
///
/// The receiver's current value is the present state; the engine reacts to
/// every subsequent change.
pub trait ConnectivityMonitor: Send + Sync {
    fn watch(&self) -> watch::Receiver<Connectivity>;
}

/// Connectivity driven explicitly by the host.
///
/// The default starts connected. Platform integrations call [`set`] when the
/// OS reports a change.
///
/// [`set`]: ManualConnectivity::set
pub struct ManualConnectivity {
    tx: watch::Sender<Connectivity>,
}

impl ManualConnectivity {
    pub fn new(initial: Connectivity) -> Self {
        let (tx, _rx) = watch::channel(initial);
        ManualConnectivity { tx }
    }

    /// Publishes a new state. Repeating the current state is not a change.
    pub fn set(&self, state: Connectivity) {
        self.tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    pub fn current(&self) -> Connectivity {
        *self.tx.borrow()
    }
}

impl Default for ManualConnectivity {
    fn default() -> Self {
        ManualConnectivity::new(Connectivity::Connected)
    }
}

impl ConnectivityMonitor for ManualConnectivity {
    fn watch(&self) -> watch::Receiver<Connectivity> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
