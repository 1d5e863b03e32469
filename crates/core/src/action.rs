// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Update actions targeting a single snippet.
//!
//! Actions arrive from the real-time channel and from the local visibility
//! scheduler. Each names a snippet by id and carries a sparse patch: present
//! fields overwrite, absent fields are left untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::snippet::{DynamicResource, Props, Snippet, TemplateEngine};

/// What an action does to its snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Created,
    Updated,
    Deleted,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Created => "created",
            ActionKind::Updated => "updated",
            ActionKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snippet fields an action may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnippetField {
    Target,
    Headers,
    Props,
    DynamicResources,
    Engine,
    VisibleFrom,
    VisibleUntil,
}

impl SnippetField {
    pub const ALL: [SnippetField; 7] = [
        SnippetField::Target,
        SnippetField::Headers,
        SnippetField::Props,
        SnippetField::DynamicResources,
        SnippetField::Engine,
        SnippetField::VisibleFrom,
        SnippetField::VisibleUntil,
    ];

    /// Returns true if changing this field means the loaded content must be
    /// reloaded, as opposed to a metadata-only change.
    pub fn is_reload_significant(&self) -> bool {
        match self {
            SnippetField::Target | SnippetField::Headers | SnippetField::Engine => true,
            SnippetField::Props
            | SnippetField::DynamicResources
            | SnippetField::VisibleFrom
            | SnippetField::VisibleUntil => false,
        }
    }
}

/// Sparse set of snippet fields carried by an action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Props>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_resources: Option<Vec<DynamicResource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<TemplateEngine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_until: Option<DateTime<Utc>>,
}

impl SnippetPatch {
    /// Applies the patch to a copy of `base`.
    ///
    /// Returns the patched snippet and the fields whose value actually changed.
    pub fn apply_to(&self, base: &Snippet) -> (Snippet, Vec<SnippetField>) {
        let mut next = base.clone();
        let mut changed = Vec::new();

        fn set<T: PartialEq + Clone>(
            slot: &mut T,
            value: &Option<T>,
            field: SnippetField,
            changed: &mut Vec<SnippetField>,
        ) {
            if let Some(value) = value {
                if slot != value {
                    *slot = value.clone();
                    changed.push(field);
                }
            }
        }

        set(&mut next.target, &self.target, SnippetField::Target, &mut changed);
        set(&mut next.headers, &self.headers, SnippetField::Headers, &mut changed);
        set(&mut next.props, &self.props, SnippetField::Props, &mut changed);
        set(
            &mut next.dynamic_resources,
            &self.dynamic_resources,
            SnippetField::DynamicResources,
            &mut changed,
        );
        set(&mut next.engine, &self.engine, SnippetField::Engine, &mut changed);
        if let Some(from) = self.visible_from {
            if next.visible_from != Some(from) {
                next.visible_from = Some(from);
                changed.push(SnippetField::VisibleFrom);
            }
        }
        if let Some(until) = self.visible_until {
            if next.visible_until != Some(until) {
                next.visible_until = Some(until);
                changed.push(SnippetField::VisibleUntil);
            }
        }

        (next, changed)
    }

    /// Builds a snippet from the patch for a CREATED action.
    ///
    /// Returns None if the patch lacks a target.
    pub fn to_snippet(&self, id: &str) -> Option<Snippet> {
        let target = self.target.clone()?;
        let (snippet, _) = self.apply_to(&Snippet::new(id, target));
        Some(snippet)
    }
}

/// A create/update/delete instruction for one snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub id: String,
    #[serde(flatten)]
    pub patch: SnippetPatch,
}

impl UpdateAction {
    pub fn new(kind: ActionKind, id: impl Into<String>, patch: SnippetPatch) -> Self {
        UpdateAction {
            kind,
            id: id.into(),
            patch,
        }
    }

    /// CREATED action carrying the full snippet.
    pub fn created(snippet: &Snippet) -> Self {
        UpdateAction::new(
            ActionKind::Created,
            snippet.id.clone(),
            SnippetPatch {
                target: Some(snippet.target.clone()),
                headers: Some(snippet.headers.clone()),
                props: Some(snippet.props.clone()),
                dynamic_resources: Some(snippet.dynamic_resources.clone()),
                engine: Some(snippet.engine.clone()),
                visible_from: snippet.visible_from,
                visible_until: snippet.visible_until,
            },
        )
    }

    pub fn updated(id: impl Into<String>, patch: SnippetPatch) -> Self {
        UpdateAction::new(ActionKind::Updated, id, patch)
    }

    pub fn deleted(id: impl Into<String>) -> Self {
        UpdateAction::new(ActionKind::Deleted, id, SnippetPatch::default())
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
