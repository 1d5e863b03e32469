// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration.
//!
//! Two layers:
//! - [`Configuration`] identifies what to sync: a whole project, or a single
//!   shared snippet. It also determines the snapshot cache key.
//! - [`EngineConfig`] tunes how to sync (API endpoint, cache location, retry
//!   and teardown timings). It is loaded from a TOML file where every field
//!   is optional.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

const CACHE_DIR_NAME: &str = "snipsync";

/// Sync target identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Configuration {
    /// All snippets of a project.
    Project {
        organization: String,
        project: String,
    },
    /// A single snippet shared by token.
    Shared { token: String },
}

impl Configuration {
    pub fn project(organization: impl Into<String>, project: impl Into<String>) -> Self {
        Configuration::Project {
            organization: organization.into(),
            project: project.into(),
        }
    }

    pub fn shared(token: impl Into<String>) -> Self {
        Configuration::Shared {
            token: token.into(),
        }
    }

    /// Validates that every identity component is non-empty.
    pub fn validate(&self) -> Result<()> {
        let blank = match self {
            Configuration::Project {
                organization,
                project,
            } => organization.trim().is_empty() || project.trim().is_empty(),
            Configuration::Shared { token } => token.trim().is_empty(),
        };
        if blank {
            return Err(Error::Config(format!("incomplete sync identity: {self}")));
        }
        Ok(())
    }

    /// Filesystem-safe key identifying this configuration.
    ///
    /// Distinct configurations always get distinct keys: characters outside
    /// `[A-Za-z0-9]` are hex-escaped rather than replaced.
    pub fn cache_key(&self) -> String {
        match self {
            Configuration::Project {
                organization,
                project,
            } => format!("project-{}-{}", sanitize(organization), sanitize(project)),
            Configuration::Shared { token } => format!("shared-{}", sanitize(token)),
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Configuration::Project {
                organization,
                project,
            } => write!(f, "project {organization}/{project}"),
            Configuration::Shared { token } => write!(f, "shared snippet {token}"),
        }
    }
}

/// Keeps ASCII alphanumerics and escapes every other byte as `_xx`.
fn sanitize(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for byte in part.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("_{byte:02x}"));
        }
    }
    out
}

/// Tuning for the sync engine, stored as TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the snippet API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Directory for snapshot caches (default: `<user cache dir>/snipsync`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// HTTP request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Fixed delay between real-time reconnect attempts in milliseconds (default: 5000).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Consecutive failed connection attempts before giving up (default: 5).
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,
    /// Delay after the last subscriber leaves before teardown in milliseconds (default: 5000).
    #[serde(default = "default_teardown_grace_ms")]
    pub teardown_grace_ms: u64,
}

fn default_api_url() -> String {
    "https://api.snippets.dev".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_teardown_grace_ms() -> u64 {
    5_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            api_url: default_api_url(),
            cache_dir: None,
            request_timeout_secs: default_request_timeout_secs(),
            retry_delay_ms: default_retry_delay_ms(),
            max_failed_attempts: default_max_failed_attempts(),
            teardown_grace_ms: default_teardown_grace_ms(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from `path` if given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Saves configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "invalid api_url '{}': must be http:// or https://",
                self.api_url
            )));
        }
        if self.max_failed_attempts == 0 {
            return Err(Error::Config(
                "max_failed_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved snapshot cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(CACHE_DIR_NAME)
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn teardown_grace(&self) -> Duration {
        Duration::from_millis(self.teardown_grace_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
