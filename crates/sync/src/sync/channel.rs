// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised real-time update channel.
//!
//! Each `connect` spawns a session task that owns one transport at a time.
//! The task decodes inbound frames into [`UpdateAction`]s and applies the
//! reconnect policy when the connection fails:
//!
//! - 401: invoke the unauthorized callback, stop
//! - 403: stop permanently
//! - anything else: wait the retry delay and reconnect, until the
//!   consecutive-failure budget is spent
//!
//! A successful open resets the failure count. An address refused with 403
//! is remembered and not dialed again until `connect` names another one.

use std::sync::Arc;
use std::time::Duration;

use snip_core::{ServerMessage, UpdateAction};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::connection::{ConnectionState, ConnectionStatus, SharedConnectionState};
use super::transport::{Transport, TransportFactory};
use crate::config::EngineConfig;

/// Invoked when the channel is refused with 401.
pub type UnauthorizedCallback = Arc<dyn Fn() + Send + Sync>;

/// Events sent from the session task to the channel's owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Action(UpdateAction),
    Status(ConnectionStatus),
}

/// Reconnect timing for failed connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// Consecutive failures after which the channel gives up.
    pub max_failed_attempts: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        RetryPolicy {
            delay: config.retry_delay(),
            max_failed_attempts: config.max_failed_attempts,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from_config(&EngineConfig::default())
    }
}

struct Session {
    address: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owner-side handle of the real-time connection.
pub struct RealtimeChannel {
    factory: TransportFactory,
    policy: RetryPolicy,
    state: Arc<SharedConnectionState>,
    event_tx: mpsc::UnboundedSender<ChannelEvent>,
    session: Option<Session>,
    /// Address of a finished session that was refused with 403.
    forbidden: Option<String>,
}

impl RealtimeChannel {
    /// Creates an idle channel.
    ///
    /// Returns the channel and a receiver for its events.
    pub fn new(
        factory: TransportFactory,
        policy: RetryPolicy,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let channel = RealtimeChannel {
            factory,
            policy,
            state: Arc::new(SharedConnectionState::new()),
            event_tx,
            session: None,
            forbidden: None,
        };
        (channel, event_rx)
    }

    pub fn state(&self) -> Arc<SharedConnectionState> {
        Arc::clone(&self.state)
    }

    /// Address of the most recent `connect`, live or not.
    pub fn address(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.address.as_str())
    }

    /// Returns true while a session is connecting, open or waiting to retry.
    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.task.is_finished())
    }

    /// Address refused with 403, if any.
    pub fn forbidden_address(&self) -> Option<&str> {
        match &self.session {
            Some(session) if self.state.get() == ConnectionState::Forbidden => {
                Some(session.address.as_str())
            }
            _ => self.forbidden.as_deref(),
        }
    }

    /// Connects to `address`.
    ///
    /// A no-op while a session for the same address is still active, and
    /// for an address that was refused with 403. A different address closes
    /// the current session first.
    pub async fn connect(&mut self, address: &str, on_unauthorized: Option<UnauthorizedCallback>) {
        if self.is_active() && self.address() == Some(address) {
            debug!("channel already active for {}", address);
            return;
        }
        if self.forbidden_address() == Some(address) {
            debug!("not reconnecting to forbidden {}", address);
            return;
        }
        self.disconnect().await;
        self.forbidden = None;

        self.state.reset_failures();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_session(
            address.to_string(),
            Arc::clone(&self.factory),
            self.policy,
            Arc::clone(&self.state),
            self.event_tx.clone(),
            cancel.clone(),
            on_unauthorized,
        ));
        self.session = Some(Session {
            address: address.to_string(),
            cancel,
            task,
        });
    }

    /// Closes the current session, waiting for the close handshake.
    ///
    /// Returns true if a live session was closed. Safe to call repeatedly.
    pub async fn disconnect(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        if self.state.get() == ConnectionState::Forbidden {
            self.forbidden = Some(session.address.clone());
        }
        let live = !session.task.is_finished();
        session.cancel.cancel();
        if let Err(e) = session.task.await {
            warn!("channel session ended abnormally: {}", e);
        }
        if live {
            info!("disconnected from {}", session.address);
        }
        live
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.cancel.cancel();
        }
    }
}

enum SessionEnd {
    Cancelled,
    Failed(Option<u16>),
}

async fn run_session(
    address: String,
    factory: TransportFactory,
    policy: RetryPolicy,
    state: Arc<SharedConnectionState>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    cancel: CancellationToken,
    on_unauthorized: Option<UnauthorizedCallback>,
) {
    loop {
        state.set(ConnectionState::Connecting);
        let mut transport = factory();
        debug!("connecting to {}", address);

        let connect_result = tokio::select! {
            _ = cancel.cancelled() => {
                state.set(ConnectionState::Closed);
                return;
            }
            result = transport.connect(&address) => result,
        };

        let failure = match connect_result {
            Ok(()) => {
                state.set(ConnectionState::Open);
                state.reset_failures();
                info!("channel open: {}", address);
                let _ = events.send(ChannelEvent::Status(ConnectionStatus::Open));

                match pump(transport.as_mut(), &events, &cancel).await {
                    SessionEnd::Cancelled => {
                        state.set(ConnectionState::Closing);
                        let _ = transport.disconnect().await;
                        state.set(ConnectionState::Closed);
                        let _ = events.send(ChannelEvent::Status(ConnectionStatus::Closed));
                        return;
                    }
                    SessionEnd::Failed(code) => code,
                }
            }
            Err(e) => {
                warn!("channel connect to {} failed: {}", address, e);
                e.failure_code()
            }
        };

        state.set(ConnectionState::Failed);
        let _ = events.send(ChannelEvent::Status(ConnectionStatus::Failed(failure)));

        match failure {
            Some(401) => {
                warn!("channel unauthorized; waiting for new credentials");
                if let Some(callback) = &on_unauthorized {
                    callback();
                }
                return;
            }
            Some(403) => {
                warn!("channel forbidden; not retrying");
                state.set(ConnectionState::Forbidden);
                return;
            }
            _ => {}
        }

        let failures = state.record_failure();
        if failures >= policy.max_failed_attempts {
            warn!(
                "giving up on {} after {} consecutive failures",
                address, failures
            );
            return;
        }

        debug!("retrying {} in {:?} (failure {})", address, policy.delay, failures);
        tokio::select! {
            _ = cancel.cancelled() => {
                state.set(ConnectionState::Closed);
                return;
            }
            _ = tokio::time::sleep(policy.delay) => {}
        }
    }
}

/// Forwards decoded actions until the connection fails or is cancelled.
async fn pump(
    transport: &mut dyn Transport,
    events: &mpsc::UnboundedSender<ChannelEvent>,
    cancel: &CancellationToken,
) -> SessionEnd {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Cancelled,
            frame = transport.recv() => frame,
        };

        match frame {
            Ok(Some(text)) => match ServerMessage::from_json(&text) {
                Ok(ServerMessage::Action(action)) => {
                    debug!("received {} for {}", action.kind.as_str(), action.id);
                    let _ = events.send(ChannelEvent::Action(action));
                }
                Ok(ServerMessage::Heartbeat) => {}
                Ok(ServerMessage::Error { message }) => {
                    warn!("channel error from server: {}", message);
                }
                Err(e) => debug!("dropping malformed frame: {}", e),
            },
            Ok(None) => {
                debug!("channel stream ended");
                return SessionEnd::Failed(None);
            }
            Err(e) => {
                warn!("channel failed: {}", e);
                return SessionEnd::Failed(e.failure_code());
            }
        }
    }
}
