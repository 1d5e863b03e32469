// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Public entry points: [`SyncBuilder`], [`SnippetSync`] and
//! [`Subscription`].

use std::sync::Arc;

use snip_core::{ClockSource, Props, SystemClock};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use crate::cache::{FileSnapshotCache, SnapshotCache};
use crate::config::{Configuration, EngineConfig};
use crate::connectivity::{ConnectivityMonitor, ManualConnectivity};
use crate::error::{Error, Result};
use crate::loader::{HttpSnippetLoader, SnippetLoader};
use crate::orchestrator::{Command, Orchestrator, Parts, Publisher, SyncOutcome};
use crate::sync::{
    websocket_factory, RealtimeChannel, RetryPolicy, TransportFactory, UnauthorizedCallback,
    VisibilityScheduler,
};

/// Assembles a sync engine from injectable parts.
///
/// Anything not supplied gets the production default: the HTTP loader,
/// the file cache under [`EngineConfig::cache_dir`], the WebSocket
/// transport, the system clock and an always-connected monitor.
pub struct SyncBuilder {
    configuration: Configuration,
    config: EngineConfig,
    loader: Option<Arc<dyn SnippetLoader>>,
    cache: Option<Arc<dyn SnapshotCache>>,
    transport: Option<TransportFactory>,
    clock: Option<Arc<dyn ClockSource>>,
    connectivity: Option<Arc<dyn ConnectivityMonitor>>,
    on_unauthorized: Option<UnauthorizedCallback>,
}

impl SyncBuilder {
    pub fn new(configuration: Configuration) -> Self {
        SyncBuilder {
            configuration,
            config: EngineConfig::default(),
            loader: None,
            cache: None,
            transport: None,
            clock: None,
            connectivity: None,
            on_unauthorized: None,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn loader(mut self, loader: Arc<dyn SnippetLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn SnapshotCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn transport(mut self, factory: TransportFactory) -> Self {
        self.transport = Some(factory);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn connectivity(mut self, connectivity: Arc<dyn ConnectivityMonitor>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Called when the real-time channel is refused with 401.
    pub fn on_unauthorized(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(callback));
        self
    }

    /// Spawns the engine on the current tokio runtime.
    pub fn build(self) -> Result<SnippetSync> {
        self.configuration.validate()?;
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let loader = match self.loader {
            Some(loader) => loader,
            None => Arc::new(HttpSnippetLoader::with_clock(
                &self.config,
                Arc::clone(&clock),
            )?),
        };
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(FileSnapshotCache::new(self.config.cache_dir())));
        let transport = self.transport.unwrap_or_else(websocket_factory);
        let connectivity = self
            .connectivity
            .unwrap_or_else(|| Arc::new(ManualConnectivity::default()));

        let parts = Parts {
            configuration: self.configuration.clone(),
            teardown_grace: self.config.teardown_grace(),
            loader,
            cache,
            connectivity,
            on_unauthorized: self.on_unauthorized,
            channel: RealtimeChannel::new(transport, RetryPolicy::from_config(&self.config)),
            scheduler: VisibilityScheduler::new(clock),
        };

        let publisher = Arc::new(Publisher::new());
        let (commands, command_rx) = mpsc::unbounded_channel();
        let orchestrator = Orchestrator::new(parts, Arc::clone(&publisher));
        tokio::spawn(orchestrator.run(command_rx));

        Ok(SnippetSync {
            inner: Arc::new(Inner {
                configuration: self.configuration,
                commands,
                publisher,
            }),
        })
    }
}

pub(crate) struct Inner {
    configuration: Configuration,
    commands: mpsc::UnboundedSender<Command>,
    publisher: Arc<Publisher>,
}

/// Handle to a running sync engine.
///
/// Cheap to clone. The engine stops once every handle and subscription
/// has been dropped.
#[derive(Clone)]
pub struct SnippetSync {
    pub(crate) inner: Arc<Inner>,
}

impl SnippetSync {
    pub fn configuration(&self) -> &Configuration {
        &self.inner.configuration
    }

    fn send(&self, command: Command) -> Result<()> {
        self.inner.commands.send(command).map_err(|_| Error::Closed)
    }

    /// Enables the engine. Nothing is loaded or connected before this.
    pub fn register(&self) -> Result<()> {
        self.send(Command::Register)
    }

    /// Subscribes to the outcome stream.
    ///
    /// The first subscription starts the engine; dropping the last one
    /// schedules teardown after the grace period.
    pub fn outcomes(&self) -> Subscription {
        let (replay, rx) = self.inner.publisher.subscribe();
        if self.send(Command::Subscribe).is_err() {
            debug!("subscribed to a stopped engine");
        }
        Subscription {
            sync: self.clone(),
            replay,
            rx,
        }
    }

    /// Reloads from the network regardless of current state.
    pub fn force_refresh(&self) -> Result<()> {
        self.send(Command::ForceRefresh)
    }

    /// Merges `props` into the local overrides for snippet `id`.
    pub fn set_local_props(&self, id: impl Into<String>, props: Props) -> Result<()> {
        self.send(Command::SetLocalProps {
            id: id.into(),
            props,
        })
    }

    /// Id of the shared snippet, once a shared configuration has loaded.
    pub async fn main_snippet_id(&self) -> Result<Option<String>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::MainSnippetId(reply))?;
        rx.await.map_err(|_| Error::Closed)
    }

    /// Removes every cached snapshot.
    pub async fn clear_cache(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ClearCache(reply))?;
        rx.await.map_err(|_| Error::Closed)?
    }
}

/// A live view of the outcome stream.
pub struct Subscription {
    sync: SnippetSync,
    replay: Option<SyncOutcome>,
    rx: broadcast::Receiver<SyncOutcome>,
}

impl Subscription {
    /// Waits for the next outcome.
    ///
    /// The first call returns the latest outcome published before the
    /// subscription, if any. A subscriber that falls behind skips to the
    /// newest outcomes.
    pub async fn next(&mut self) -> Option<SyncOutcome> {
        if let Some(outcome) = self.replay.take() {
            return Some(outcome);
        }
        loop {
            match self.rx.recv().await {
                Ok(outcome) => return Some(outcome),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("subscriber skipped {} outcomes", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.sync.send(Command::Unsubscribe);
    }
}
