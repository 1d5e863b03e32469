// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use tempfile::TempDir;

fn snippets() -> Vec<Snippet> {
    vec![
        Snippet::new("a", "https://example.com/a").with_prop("color", json!("red")),
        Snippet::new("b", "https://example.com/b"),
    ]
}

#[test]
fn file_cache_save_then_load() {
    let dir = TempDir::new().unwrap();
    let cache = FileSnapshotCache::new(dir.path().join("cache"));

    cache.save("project-acme-web", &snippets()).unwrap();

    assert_eq!(cache.load("project-acme-web"), Some(snippets()));
}

#[test]
fn lookalike_identities_keep_separate_snapshots() {
    let dir = TempDir::new().unwrap();
    let cache = FileSnapshotCache::new(dir.path());
    let dotted = crate::config::Configuration::project("acme", "a.b").cache_key();
    let underscored = crate::config::Configuration::project("acme", "a_b").cache_key();

    cache.save(&dotted, &snippets()).unwrap();

    assert_eq!(cache.load(&dotted), Some(snippets()));
    assert!(cache.load(&underscored).is_none());
}

#[test]
fn file_cache_missing_key_is_none() {
    let dir = TempDir::new().unwrap();
    let cache = FileSnapshotCache::new(dir.path());
    assert!(cache.load("nothing-here").is_none());
}

#[test]
fn file_cache_corrupt_snapshot_is_none() {
    let dir = TempDir::new().unwrap();
    let cache = FileSnapshotCache::new(dir.path());
    std::fs::write(dir.path().join("broken.jsonl"), "{\"id\":\n").unwrap();

    assert!(cache.load("broken").is_none());
}

#[test]
fn file_cache_keys_are_isolated() {
    let dir = TempDir::new().unwrap();
    let cache = FileSnapshotCache::new(dir.path());

    cache.save("one", &snippets()).unwrap();
    cache.save("two", &snippets()[..1]).unwrap();

    assert_eq!(cache.load("one").unwrap().len(), 2);
    assert_eq!(cache.load("two").unwrap().len(), 1);
}

#[test]
fn file_cache_empty_list_is_a_snapshot() {
    let dir = TempDir::new().unwrap();
    let cache = FileSnapshotCache::new(dir.path());

    cache.save("empty", &[]).unwrap();

    assert_eq!(cache.load("empty"), Some(vec![]));
}

#[test]
fn file_cache_clear_removes_snapshots_only() {
    let dir = TempDir::new().unwrap();
    let cache = FileSnapshotCache::new(dir.path());
    cache.save("one", &snippets()).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

    cache.clear().unwrap();

    assert!(cache.load("one").is_none());
    assert!(dir.path().join("notes.txt").exists());
}

#[test]
fn file_cache_clear_without_dir() {
    let dir = TempDir::new().unwrap();
    let cache = FileSnapshotCache::new(dir.path().join("never-created"));
    cache.clear().unwrap();
}

#[test]
fn memory_cache_roundtrip_and_clear() {
    let cache = MemorySnapshotCache::with_entry("k", snippets());
    assert_eq!(cache.load("k"), Some(snippets()));

    cache.clear().unwrap();
    assert!(cache.load("k").is_none());
}

#[tokio::test]
async fn writer_applies_saves_in_order_before_clear() {
    let cache = Arc::new(MemorySnapshotCache::new());
    let writer = CacheWriter::spawn(cache.clone(), "k".to_string());

    writer.save(snippets());
    writer.save(snippets()[..1].to_vec());
    writer.clear().await.unwrap();
    assert!(cache.load("k").is_none());

    writer.save(snippets());
    writer.clear().await.unwrap();
    writer.save(snippets()[1..].to_vec());
    // A clear acts as a barrier for the save queued before it.
    writer.clear().await.unwrap();
    assert!(cache.load("k").is_none());
}

#[tokio::test]
async fn writer_persists_to_file_cache() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(FileSnapshotCache::new(dir.path()));
    let writer = CacheWriter::spawn(cache.clone(), "k".to_string());

    writer.save(snippets());
    writer.save(snippets()[1..].to_vec());

    let expected = Some(snippets()[1..].to_vec());
    for _ in 0..200 {
        if cache.load("k") == expected {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(cache.load("k"), expected);
}
