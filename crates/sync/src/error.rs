// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors that can occur in the snipsync library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(String),

    #[error("request to {url} failed with status {status}")]
    Http { status: u16, url: String },

    #[error("real-time channel rejected credentials\n  hint: refresh the access token and reconnect")]
    Auth,

    #[error("real-time channel access forbidden")]
    Forbidden,

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("sync engine is no longer running")]
    Closed,

    #[error(transparent)]
    Core(#[from] snip_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true for failures a later retry may recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Http { .. } | Error::Io(_))
    }

    /// Classifies a real-time channel failure by its reported code.
    pub fn from_channel_failure(code: Option<u16>) -> Self {
        match code {
            Some(401) => Error::Auth,
            Some(403) => Error::Forbidden,
            Some(code) => Error::Network(format!("channel failed with code {code}")),
            None => Error::Network("channel connection lost".to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Error::Http {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            Error::Network(e.to_string())
        }
    }
}

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
