// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fakes for engine tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use snip_core::{ClockSource, Snippet};
use tokio::sync::mpsc;

use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::loader::{LoadFuture, ProjectResult, SnippetLoader};
use crate::sync::{Transport, TransportError, TransportFactory, TransportResult};

/// Server time used as "t" throughout the tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn secs(n: i64) -> chrono::Duration {
    chrono::Duration::seconds(n)
}

pub fn snippet(id: &str) -> Snippet {
    Snippet::new(id, format!("https://cdn.example.com/{id}.html"))
}

pub fn ids(list: &[Snippet]) -> Vec<&str> {
    list.iter().map(|s| s.id.as_str()).collect()
}

pub fn project_result(snippets: Vec<Snippet>, channel: &str) -> ProjectResult {
    ProjectResult {
        snippets,
        channel: channel.to_string(),
        server_time: t0(),
        main_snippet_id: None,
    }
}

/// Device clock that follows tokio's (pausable) time.
pub struct TokioClock {
    base: DateTime<Utc>,
    start: tokio::time::Instant,
}

impl TokioClock {
    pub fn new(base: DateTime<Utc>) -> Self {
        TokioClock {
            base,
            start: tokio::time::Instant::now(),
        }
    }
}

impl ClockSource for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        self.base + chrono::Duration::from_std(self.start.elapsed()).unwrap()
    }
}

#[derive(Default)]
struct LoaderState {
    responses: VecDeque<Result<ProjectResult>>,
    fallback: Option<ProjectResult>,
    delay: Duration,
    calls: usize,
}

/// Loader returning scripted results, optionally after a delay.
#[derive(Clone, Default)]
pub struct FakeLoader {
    state: Arc<Mutex<LoaderState>>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a one-shot response.
    pub fn respond(&self, response: Result<ProjectResult>) {
        self.state.lock().unwrap().responses.push_back(response);
    }

    /// Response used once the queue is empty.
    pub fn respond_always(&self, result: ProjectResult) {
        self.state.lock().unwrap().fallback = Some(result);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = delay;
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

impl SnippetLoader for FakeLoader {
    fn load<'a>(&'a self, _configuration: &'a Configuration) -> LoadFuture<'a> {
        Box::pin(async move {
            let (delay, response) = {
                let mut state = self.state.lock().unwrap();
                state.calls += 1;
                let response = match state.responses.pop_front() {
                    Some(response) => response,
                    None => state
                        .fallback
                        .clone()
                        .ok_or_else(|| Error::Network("no scripted response".to_string())),
                };
                (state.delay, response)
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            response
        })
    }
}

type Frame = TransportResult<Option<String>>;

#[derive(Default)]
struct HubState {
    connects: Vec<String>,
    disconnects: usize,
    failures: VecDeque<TransportError>,
    live: Option<mpsc::UnboundedSender<Frame>>,
}

/// Hands out mock transports and lets a test play the backend.
#[derive(Clone, Default)]
pub struct MockHub {
    state: Arc<Mutex<HubState>>,
}

impl MockHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> TransportFactory {
        let hub = self.clone();
        Arc::new(move || {
            Box::new(MockTransport {
                hub: hub.clone(),
                rx: None,
            })
        })
    }

    /// Makes the next connect attempt fail with `error`.
    pub fn fail_next(&self, error: TransportError) {
        self.state.lock().unwrap().failures.push_back(error);
    }

    /// Addresses of every connect attempt so far.
    pub fn connects(&self) -> Vec<String> {
        self.state.lock().unwrap().connects.clone()
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }

    /// Sends a text frame on the newest open connection.
    pub fn push(&self, text: impl Into<String>) {
        self.send(Ok(Some(text.into())));
    }

    /// Closes the newest open connection with a close frame.
    pub fn close(&self, code: u16) {
        self.send(Err(TransportError::Closed { code }));
    }

    fn send(&self, frame: Frame) {
        let state = self.state.lock().unwrap();
        if let Some(live) = &state.live {
            let _ = live.send(frame);
        }
    }
}

struct MockTransport {
    hub: MockHub,
    rx: Option<mpsc::UnboundedReceiver<Frame>>,
}

impl Transport for MockTransport {
    fn connect(
        &mut self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let url = url.to_string();
        Box::pin(async move {
            let mut state = self.hub.state.lock().unwrap();
            state.connects.push(url);
            if let Some(error) = state.failures.pop_front() {
                return Err(error);
            }
            let (tx, rx) = mpsc::unbounded_channel();
            state.live = Some(tx);
            self.rx = Some(rx);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if self.rx.take().is_some() {
                self.hub.state.lock().unwrap().disconnects += 1;
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<Option<String>>> + Send + '_>> {
        Box::pin(async move {
            let rx = self.rx.as_mut().ok_or(TransportError::ConnectionClosed)?;
            let frame = rx.recv().await.unwrap_or(Ok(None));
            if !matches!(frame, Ok(Some(_))) {
                self.rx = None;
            }
            frame
        })
    }

    fn is_connected(&self) -> bool {
        self.rx.is_some()
    }
}
