// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot fetch of a project's snippets over HTTP.
//!
//! A project configuration is fetched directly. A shared configuration is
//! first resolved to its project, then fetched; the resolved snippet id is
//! reported as the main snippet.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, DATE};
use reqwest::{Client, Url};
use serde::Deserialize;
use snip_core::{ClockSource, Snippet, SystemClock};
use tracing::{debug, info};

use crate::config::{Configuration, EngineConfig};
use crate::error::{Error, Result};

/// Result of a full project fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectResult {
    pub snippets: Vec<Snippet>,
    /// Address of the real-time update channel.
    pub channel: String,
    /// Server-reported time of the response.
    pub server_time: DateTime<Utc>,
    /// Id of the shared snippet, for shared configurations.
    pub main_snippet_id: Option<String>,
}

/// Boxed future returned by [`SnippetLoader::load`].
pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<ProjectResult>> + Send + 'a>>;

/// Fetches the full snippet list for a sync identity.
pub trait SnippetLoader: Send + Sync {
    fn load<'a>(&'a self, configuration: &'a Configuration) -> LoadFuture<'a>;
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    snippets: Vec<Snippet>,
    channel: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SharedResponse {
    organization_id: String,
    project_id: String,
    snippet_id: String,
}

/// Snippet loader backed by the snippet REST API.
pub struct HttpSnippetLoader {
    client: Client,
    api_url: Url,
    clock: Arc<dyn ClockSource>,
}

impl HttpSnippetLoader {
    /// Creates a loader for the API configured in `config`.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a loader using `clock` when a response carries no server time.
    pub fn with_clock(config: &EngineConfig, clock: Arc<dyn ClockSource>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| Error::Config(format!("invalid api_url '{}': {e}", config.api_url)))?;

        Ok(HttpSnippetLoader {
            client,
            api_url,
            clock,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("api_url '{}' cannot be a base", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    async fn fetch_project(&self, organization: &str, project: &str) -> Result<ProjectResult> {
        let url = self.endpoint(&["organizations", organization, "projects", project])?;
        let response = self.get(url).await?;
        let server_time = server_time(response.headers(), self.clock.as_ref());
        let body: ProjectResponse = response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("project response: {e}")))?;

        info!(
            "loaded {} snippets for {}/{}",
            body.snippets.len(),
            organization,
            project
        );
        Ok(ProjectResult {
            snippets: body.snippets,
            channel: body.channel,
            server_time,
            main_snippet_id: None,
        })
    }

    async fn resolve_shared(&self, token: &str) -> Result<SharedResponse> {
        let url = self.endpoint(&["shared", token])?;
        let response = self.get(url).await?;
        response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("shared snippet response: {e}")))
    }

    async fn load_configuration(&self, configuration: &Configuration) -> Result<ProjectResult> {
        match configuration {
            Configuration::Project {
                organization,
                project,
            } => self.fetch_project(organization, project).await,
            Configuration::Shared { token } => {
                let shared = self.resolve_shared(token).await?;
                debug!(
                    "shared token resolved to {}/{} snippet {}",
                    shared.organization_id, shared.project_id, shared.snippet_id
                );
                let mut result = self
                    .fetch_project(&shared.organization_id, &shared.project_id)
                    .await?;
                result.main_snippet_id = Some(shared.snippet_id);
                Ok(result)
            }
        }
    }
}

impl SnippetLoader for HttpSnippetLoader {
    fn load<'a>(&'a self, configuration: &'a Configuration) -> LoadFuture<'a> {
        Box::pin(self.load_configuration(configuration))
    }
}

/// Reads the server time from the `Date` header, falling back to `clock`.
pub(crate) fn server_time(headers: &HeaderMap, clock: &dyn ClockSource) -> DateTime<Utc> {
    headers
        .get(DATE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
        .map(|time| time.with_timezone(&Utc))
        .unwrap_or_else(|| clock.now())
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
