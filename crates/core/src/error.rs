// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for snip-core operations.

use thiserror::Error;

/// All possible errors that can occur in snip-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed message: {0}")]
    Decode(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("{0}")]
    InvalidInput(String),
}

/// A specialized Result type for snip-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
