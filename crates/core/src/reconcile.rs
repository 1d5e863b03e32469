// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Apply update actions to the canonical snippet list.
//!
//! Reconcile rules:
//! - Created: unknown id appends at the end; known id is treated as Updated
//! - Updated: present fields overwrite, absent fields are untouched; unknown id is a no-op
//! - Deleted: removes the entry; unknown id is a no-op
//! - `load_iteration` is bumped once when a reload-significant field changes
//!
//! A no-op returns `None` so callers never emit a spurious update. Applying
//! the same action twice changes state at most once.

use std::collections::HashMap;

use crate::action::{ActionKind, SnippetPatch, UpdateAction};
use crate::snippet::{Props, Snippet};

/// Applies an action to `list`.
///
/// Returns the new list, or `None` if the action produced no observable change.
pub fn apply(list: &[Snippet], action: &UpdateAction) -> Option<Vec<Snippet>> {
    let position = list.iter().position(|s| s.id == action.id);

    match (action.kind, position) {
        (ActionKind::Created, None) => {
            let snippet = action.patch.to_snippet(&action.id)?;
            let mut next = list.to_vec();
            next.push(snippet);
            Some(next)
        }
        (ActionKind::Created | ActionKind::Updated, Some(index)) => {
            let updated = patch_snippet(&list[index], &action.patch)?;
            let mut next = list.to_vec();
            next[index] = updated;
            Some(next)
        }
        (ActionKind::Updated, None) => None,
        (ActionKind::Deleted, Some(index)) => {
            let mut next = list.to_vec();
            next.remove(index);
            Some(next)
        }
        (ActionKind::Deleted, None) => None,
    }
}

/// Applies actions in order.
///
/// Returns the final list and the number of actions that changed it.
pub fn apply_all<'a>(
    list: &[Snippet],
    actions: impl IntoIterator<Item = &'a UpdateAction>,
) -> (Vec<Snippet>, usize) {
    let mut current = list.to_vec();
    let mut applied = 0;
    for action in actions {
        if let Some(next) = apply(&current, action) {
            current = next;
            applied += 1;
        }
    }
    (current, applied)
}

/// Patches one snippet, bumping `load_iteration` on reload-significant changes.
fn patch_snippet(base: &Snippet, patch: &SnippetPatch) -> Option<Snippet> {
    let (mut next, changed) = patch.apply_to(base);
    if changed.is_empty() {
        return None;
    }
    if changed.iter().any(|field| field.is_reload_significant()) {
        next.load_iteration = base.load_iteration.saturating_add(1);
    }
    Some(next)
}

/// Overlays caller-supplied property overrides onto `list`.
///
/// Local keys shadow remote keys of the same name. The input list is not
/// modified; overrides for ids absent from the list are ignored.
pub fn overlay(list: &[Snippet], local: &HashMap<String, Props>) -> Vec<Snippet> {
    list.iter()
        .map(|snippet| match local.get(&snippet.id) {
            Some(overrides) if !overrides.is_empty() => {
                let mut merged = snippet.clone();
                merged
                    .props
                    .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
                merged
            }
            _ => snippet.clone(),
        })
        .collect()
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
