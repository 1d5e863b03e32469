// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot cache for warm starts.
//!
//! The last known snippet list is persisted per sync identity so a new
//! subscriber sees data before the network answers. Missing or corrupt
//! snapshots read as "no cache"; they never fail the engine.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use snip_core::{jsonl, Snippet};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{Error, Result};

const SNAPSHOT_EXTENSION: &str = "jsonl";

/// Persistent store for the last known snippet list, keyed by sync identity.
pub trait SnapshotCache: Send + Sync {
    /// Stores `snippets` under `key`, replacing any previous snapshot.
    fn save(&self, key: &str, snippets: &[Snippet]) -> Result<()>;

    /// Returns the snapshot stored under `key`, or `None` if there is no
    /// usable snapshot.
    fn load(&self, key: &str) -> Option<Vec<Snippet>>;

    /// Removes every stored snapshot.
    fn clear(&self) -> Result<()>;
}

/// Snapshot cache storing one JSONL file per key.
#[derive(Debug, Clone)]
pub struct FileSnapshotCache {
    dir: PathBuf,
}

impl FileSnapshotCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSnapshotCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{SNAPSHOT_EXTENSION}"))
    }
}

impl SnapshotCache for FileSnapshotCache {
    fn save(&self, key: &str, snippets: &[Snippet]) -> Result<()> {
        let path = self.path_for(key);
        jsonl::write_all(&path, snippets)?;
        debug!("cached {} snippets at {}", snippets.len(), path.display());
        Ok(())
    }

    fn load(&self, key: &str) -> Option<Vec<Snippet>> {
        let path = self.path_for(key);
        match jsonl::read_all(&path) {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!("ignoring unreadable snapshot {}: {}", path.display(), e);
                None
            }
        }
    }

    fn clear(&self) -> Result<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == SNAPSHOT_EXTENSION) {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// In-memory snapshot cache, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySnapshotCache {
    entries: Mutex<HashMap<String, Vec<Snippet>>>,
}

impl MemorySnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-populated with one snapshot.
    pub fn with_entry(key: impl Into<String>, snippets: Vec<Snippet>) -> Self {
        let cache = Self::new();
        cache.lock().insert(key.into(), snippets);
        cache
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Snippet>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotCache for MemorySnapshotCache {
    fn save(&self, key: &str, snippets: &[Snippet]) -> Result<()> {
        self.lock().insert(key.to_string(), snippets.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> Option<Vec<Snippet>> {
        self.lock().get(key).cloned()
    }

    fn clear(&self) -> Result<()> {
        self.lock().clear();
        Ok(())
    }
}

enum CacheOp {
    Save(Vec<Snippet>),
    Clear(oneshot::Sender<Result<()>>),
}

/// Funnels every write for one key through a single background task.
///
/// Writes run on the blocking pool in submission order, so there is never
/// more than one writer per key.
#[derive(Clone)]
pub struct CacheWriter {
    tx: mpsc::UnboundedSender<CacheOp>,
}

impl CacheWriter {
    pub fn spawn(cache: Arc<dyn SnapshotCache>, key: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(cache, key, rx));
        CacheWriter { tx }
    }

    /// Queues `snippets` to be stored. Failures are logged.
    pub fn save(&self, snippets: Vec<Snippet>) {
        if self.tx.send(CacheOp::Save(snippets)).is_err() {
            warn!("cache writer stopped; snapshot not saved");
        }
    }

    /// Clears the cache once every queued save has been written.
    pub async fn clear(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(CacheOp::Clear(reply))
            .map_err(|_| Error::Closed)?;
        rx.await.map_err(|_| Error::Closed)?
    }
}

async fn run_writer(
    cache: Arc<dyn SnapshotCache>,
    key: String,
    mut rx: mpsc::UnboundedReceiver<CacheOp>,
) {
    while let Some(op) = rx.recv().await {
        let cache = Arc::clone(&cache);
        match op {
            CacheOp::Save(snippets) => {
                let key = key.clone();
                let result = tokio::task::spawn_blocking(move || cache.save(&key, &snippets))
                    .await
                    .unwrap_or_else(|e| Err(Error::Io(std::io::Error::other(e))));
                if let Err(e) = result {
                    warn!("failed to cache snapshot: {}", e);
                }
            }
            CacheOp::Clear(reply) => {
                let result = tokio::task::spawn_blocking(move || cache.clear())
                    .await
                    .unwrap_or_else(|e| Err(Error::Io(std::io::Error::other(e))));
                let _ = reply.send(result);
            }
        }
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
