// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One engine per sync identity, without a process-wide singleton.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::debug;

use crate::config::Configuration;
use crate::error::Result;
use crate::handle::{Inner, SnippetSync};

/// Weakly holds the engine for each configuration identity.
///
/// The registry never keeps an engine alive by itself: once every handle
/// for an identity is dropped, the next request builds a fresh engine.
#[derive(Default)]
pub struct SyncRegistry {
    engines: Mutex<HashMap<Configuration, Weak<Inner>>>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Configuration, Weak<Inner>>> {
        self.engines.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the live engine for `configuration`, if any.
    pub fn get(&self, configuration: &Configuration) -> Option<SnippetSync> {
        self.lock()
            .get(configuration)
            .and_then(Weak::upgrade)
            .map(|inner| SnippetSync { inner })
    }

    /// Returns the live engine for `configuration`, or builds one with
    /// `build`.
    pub fn get_or_create<F>(&self, configuration: &Configuration, build: F) -> Result<SnippetSync>
    where
        F: FnOnce(&Configuration) -> Result<SnippetSync>,
    {
        let mut engines = self.lock();
        if let Some(inner) = engines.get(configuration).and_then(Weak::upgrade) {
            return Ok(SnippetSync { inner });
        }

        let sync = build(configuration)?;
        engines.retain(|_, engine| engine.strong_count() > 0);
        engines.insert(configuration.clone(), Arc::downgrade(&sync.inner));
        debug!("registered engine for {}", configuration);
        Ok(sync)
    }

    /// Number of engines still alive.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|engine| engine.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
