// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for the real-time channel.
//!
//! Provides a trait-based transport layer that enables:
//! - Real WebSocket connections for production
//! - Scripted transports for unit testing
//!
//! A transport hands back raw text frames. Decoding them into actions is the
//! channel's job, so a malformed frame never tears down the connection.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Close codes the backend uses to signal authorization failures.
const CLOSE_UNAUTHORIZED: u16 = 4401;
const CLOSE_FORBIDDEN: u16 = 4403;

/// Upper bound on the close handshake.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection failed before a handshake response.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Handshake refused with an HTTP status.
    #[error("handshake rejected with status {status}")]
    Rejected { status: u16 },

    /// Peer sent a close frame.
    #[error("closed by peer with code {code}")]
    Closed { code: u16 },

    /// Not connected.
    #[error("connection closed")]
    ConnectionClosed,

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

impl TransportError {
    /// Status code reported for this failure, if any.
    ///
    /// Application close codes 4401 and 4403 are reported as 401 and 403.
    pub fn failure_code(&self) -> Option<u16> {
        match self {
            TransportError::Rejected { status } => Some(*status),
            TransportError::Closed {
                code: CLOSE_UNAUTHORIZED,
            } => Some(401),
            TransportError::Closed {
                code: CLOSE_FORBIDDEN,
            } => Some(403),
            TransportError::Closed { code } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport trait for WebSocket-like communication.
pub trait Transport: Send + Sync {
    /// Connect to a remote address.
    fn connect(
        &mut self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Close the connection. Closing twice is a no-op.
    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Receive the next text frame.
    ///
    /// Returns `None` if the stream ended without a close frame.
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<Option<String>>> + Send + '_>>;

    /// Check if connected.
    fn is_connected(&self) -> bool;
}

/// Creates a fresh transport for every connection attempt.
pub type TransportFactory = Arc<dyn Fn() -> Box<dyn Transport> + Send + Sync>;

/// Factory producing [`WebSocketTransport`]s.
pub fn websocket_factory() -> TransportFactory {
    Arc::new(|| Box::new(WebSocketTransport::new()))
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport implementation using tokio-tungstenite.
#[derive(Default)]
pub struct WebSocketTransport {
    ws: Option<WebSocketConnection>,
}

struct WebSocketConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        WebSocketTransport { ws: None }
    }
}

fn connect_error(e: tungstenite::Error) -> TransportError {
    match e {
        tungstenite::Error::Http(response) => TransportError::Rejected {
            status: response.status().as_u16(),
        },
        other => TransportError::ConnectionFailed(other.to_string()),
    }
}

impl Transport for WebSocketTransport {
    fn connect(
        &mut self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws, _) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(connect_error)?;
            let (sink, stream) = ws.split();
            self.ws = Some(WebSocketConnection { sink, stream });
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if let Some(mut ws) = self.ws.take() {
                // Best effort: the peer may already be gone.
                let _ = tokio::time::timeout(CLOSE_TIMEOUT, ws.sink.close()).await;
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<Option<String>>> + Send + '_>> {
        Box::pin(async move {
            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            loop {
                match ws.stream.next().await {
                    Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                    Some(Ok(Message::Close(frame))) => {
                        self.ws = None;
                        return match frame {
                            Some(frame) => Err(TransportError::Closed {
                                code: u16::from(frame.code),
                            }),
                            None => Ok(None),
                        };
                    }
                    // Ping/pong are answered by tungstenite; binary frames carry nothing for us
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        self.ws = None;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                    None => {
                        self.ws = None;
                        return Ok(None);
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}
