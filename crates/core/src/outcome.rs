// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tri-state result of a fetch that retains the best known data.

/// Outcome of a fetch, carrying the best known value on every variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T, E> {
    /// A fetch is in flight. Carries the last known data, if any.
    Progress { data: Option<T> },
    /// Authoritative, fresh data.
    Success { data: T },
    /// The fetch failed. Carries the last known data, if any.
    Error { cause: E, data: Option<T> },
}

impl<T, E> Outcome<T, E> {
    pub fn progress(data: Option<T>) -> Self {
        Outcome::Progress { data }
    }

    pub fn success(data: T) -> Self {
        Outcome::Success { data }
    }

    pub fn error(cause: E, data: Option<T>) -> Self {
        Outcome::Error { cause, data }
    }

    /// Returns the carried data, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Progress { data } | Outcome::Error { data, .. } => data.as_ref(),
            Outcome::Success { data } => Some(data),
        }
    }

    /// Consumes the outcome and returns the carried data, if any.
    pub fn into_data(self) -> Option<T> {
        match self {
            Outcome::Progress { data } | Outcome::Error { data, .. } => data,
            Outcome::Success { data } => Some(data),
        }
    }

    pub fn is_progress(&self) -> bool {
        matches!(self, Outcome::Progress { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error { .. })
    }

    /// Returns the failure cause for `Error` outcomes.
    pub fn cause(&self) -> Option<&E> {
        match self {
            Outcome::Error { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Returns the same variant carrying `data` instead.
    ///
    /// A `Success` handed no data degrades to `Progress`.
    pub fn with_data<U>(&self, data: Option<U>) -> Outcome<U, E>
    where
        E: Clone,
    {
        match (self, data) {
            (Outcome::Success { .. }, Some(data)) => Outcome::Success { data },
            (Outcome::Success { .. }, None) => Outcome::Progress { data: None },
            (Outcome::Progress { .. }, data) => Outcome::Progress { data },
            (Outcome::Error { cause, .. }, data) => Outcome::Error {
                cause: cause.clone(),
                data,
            },
        }
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
