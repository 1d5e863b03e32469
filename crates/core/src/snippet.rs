// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Snippet records and their attachments.
//!
//! A snippet is a remotely configured content record: a target URL to load,
//! request headers, free-form properties, attached resources and an optional
//! visibility window. The sync engine never interprets the content itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form snippet properties. Remote values may be shadowed by local overrides.
pub type Props = BTreeMap<String, serde_json::Value>;

/// Template engine selector, opaque to the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TemplateEngine {
    /// Content is loaded as-is.
    #[default]
    None,
    Handlebars,
    Mustache,
    /// An engine this client does not know about; preserved verbatim.
    Other(String),
}

impl TemplateEngine {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            TemplateEngine::None => "none",
            TemplateEngine::Handlebars => "handlebars",
            TemplateEngine::Mustache => "mustache",
            TemplateEngine::Other(name) => name,
        }
    }
}

impl From<String> for TemplateEngine {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "" | "none" => TemplateEngine::None,
            "handlebars" => TemplateEngine::Handlebars,
            "mustache" => TemplateEngine::Mustache,
            _ => TemplateEngine::Other(s),
        }
    }
}

impl From<TemplateEngine> for String {
    fn from(engine: TemplateEngine) -> Self {
        engine.as_str().to_string()
    }
}

impl fmt::Display for TemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of content a dynamic resource carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    Stylesheet,
    Script,
    Font,
    Image,
    Other(String),
}

impl ResourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceKind::Stylesheet => "stylesheet",
            ResourceKind::Script => "script",
            ResourceKind::Font => "font",
            ResourceKind::Image => "image",
            ResourceKind::Other(kind) => kind,
        }
    }
}

impl From<String> for ResourceKind {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "stylesheet" | "css" => ResourceKind::Stylesheet,
            "script" | "js" => ResourceKind::Script,
            "font" => ResourceKind::Font,
            "image" => ResourceKind::Image,
            _ => ResourceKind::Other(s),
        }
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        kind.as_str().to_string()
    }
}

/// An attachment loaded alongside the snippet's target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicResource {
    pub url: String,
    pub kind: ResourceKind,
}

impl DynamicResource {
    pub fn new(url: impl Into<String>, kind: ResourceKind) -> Self {
        DynamicResource {
            url: url.into(),
            kind,
        }
    }
}

/// A remotely configured content record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    /// Unique within a snippet list.
    pub id: String,
    /// URL the content is loaded from.
    pub target: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub props: Props,
    #[serde(default)]
    pub dynamic_resources: Vec<DynamicResource>,
    #[serde(default)]
    pub engine: TemplateEngine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_until: Option<DateTime<Utc>>,
    /// Bumped whenever the loaded content itself must be reloaded downstream.
    #[serde(default)]
    pub load_iteration: u64,
}

impl Snippet {
    /// Creates a snippet with the given id and target and no metadata.
    pub fn new(id: impl Into<String>, target: impl Into<String>) -> Self {
        Snippet {
            id: id.into(),
            target: target.into(),
            headers: BTreeMap::new(),
            props: Props::new(),
            dynamic_resources: Vec::new(),
            engine: TemplateEngine::None,
            visible_from: None,
            visible_until: None,
            load_iteration: 0,
        }
    }

    /// Sets the end of the visibility window.
    pub fn with_visible_until(mut self, until: DateTime<Utc>) -> Self {
        self.visible_until = Some(until);
        self
    }

    /// Sets the start of the visibility window.
    pub fn with_visible_from(mut self, from: DateTime<Utc>) -> Self {
        self.visible_from = Some(from);
        self
    }

    /// Adds a remote property.
    pub fn with_prop(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    /// Returns true if the visibility window has ended at `now` (server time).
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.visible_until.is_some_and(|until| until <= now)
    }
}

#[cfg(test)]
#[path = "snippet_tests.rs"]
mod tests;
