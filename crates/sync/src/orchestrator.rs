// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The sync engine's actor.
//!
//! One task owns the canonical snippet list and the local-override map.
//! Every producer posts into a queue that this task drains one item at a
//! time:
//!
//! - handle commands (subscribe, refresh, local props, ...)
//! - cache and HTTP load results
//! - channel actions and status changes
//! - scheduler expiries
//! - connectivity transitions
//! - the teardown grace timer
//!
//! Reconciliation therefore never runs concurrently with itself, and
//! actions are applied in arrival order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use snip_core::{reconcile, Outcome, Props, Snippet, UpdateAction};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{CacheWriter, SnapshotCache};
use crate::config::Configuration;
use crate::connectivity::{Connectivity, ConnectivityMonitor};
use crate::error::{Error, Result};
use crate::loader::{ProjectResult, SnippetLoader};
use crate::sync::{
    ChannelEvent, ConnectionStatus, RealtimeChannel, UnauthorizedCallback, VisibilityScheduler,
};

/// Outcome type published to subscribers.
pub type SyncOutcome = Outcome<Vec<Snippet>, Arc<Error>>;

/// Capacity of the outcome broadcast; slower subscribers skip ahead.
const OUTCOME_CAPACITY: usize = 64;

/// Requests from handles to the actor.
pub(crate) enum Command {
    Register,
    Subscribe,
    Unsubscribe,
    ForceRefresh,
    SetLocalProps { id: String, props: Props },
    MainSnippetId(oneshot::Sender<Option<String>>),
    ClearCache(oneshot::Sender<Result<()>>),
}

/// Results posted back by background work.
enum Internal {
    CacheLoaded {
        generation: u64,
        snippets: Option<Vec<Snippet>>,
    },
    Loaded {
        generation: u64,
        result: Result<ProjectResult>,
    },
}

/// Latest outcome plus the broadcast that carries later ones.
///
/// Both are updated under one lock so a new subscriber's replay and its
/// stream never overlap or leave a gap.
pub(crate) struct Publisher {
    latest: Mutex<Option<SyncOutcome>>,
    tx: broadcast::Sender<SyncOutcome>,
}

impl Publisher {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = broadcast::channel(OUTCOME_CAPACITY);
        Publisher {
            latest: Mutex::new(None),
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<SyncOutcome>> {
        self.latest.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, outcome: SyncOutcome) {
        let mut latest = self.lock();
        *latest = Some(outcome.clone());
        // No receivers is fine; the outcome is still replayed.
        let _ = self.tx.send(outcome);
    }

    fn clear(&self) {
        *self.lock() = None;
    }

    pub(crate) fn subscribe(&self) -> (Option<SyncOutcome>, broadcast::Receiver<SyncOutcome>) {
        let latest = self.lock();
        (latest.clone(), self.tx.subscribe())
    }
}

/// Collaborators and settings the actor is built from.
pub(crate) struct Parts {
    pub configuration: Configuration,
    pub teardown_grace: Duration,
    pub loader: Arc<dyn SnippetLoader>,
    pub cache: Arc<dyn SnapshotCache>,
    pub connectivity: Arc<dyn ConnectivityMonitor>,
    pub on_unauthorized: Option<UnauthorizedCallback>,
    pub channel: (RealtimeChannel, mpsc::UnboundedReceiver<ChannelEvent>),
    pub scheduler: (VisibilityScheduler, mpsc::UnboundedReceiver<UpdateAction>),
}

pub(crate) struct Orchestrator {
    configuration: Configuration,
    teardown_grace: Duration,
    loader: Arc<dyn SnippetLoader>,
    cache: Arc<dyn SnapshotCache>,
    cache_writer: CacheWriter,
    connectivity: Arc<dyn ConnectivityMonitor>,
    on_unauthorized: Option<UnauthorizedCallback>,
    publisher: Arc<Publisher>,

    channel: RealtimeChannel,
    channel_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    scheduler: VisibilityScheduler,
    expiry_rx: mpsc::UnboundedReceiver<UpdateAction>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    connectivity_rx: Option<watch::Receiver<Connectivity>>,

    registered: bool,
    started: bool,
    online: bool,
    subscribers: usize,
    teardown_at: Option<Instant>,
    /// Bumped on teardown so results of work started before it are dropped.
    generation: u64,

    canonical: Option<Vec<Snippet>>,
    local_props: HashMap<String, Props>,
    latest: Option<SyncOutcome>,
    channel_address: Option<String>,
    main_snippet_id: Option<String>,
}

impl Orchestrator {
    pub(crate) fn new(parts: Parts, publisher: Arc<Publisher>) -> Self {
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (channel, channel_rx) = parts.channel;
        let (scheduler, expiry_rx) = parts.scheduler;
        let cache_writer =
            CacheWriter::spawn(Arc::clone(&parts.cache), parts.configuration.cache_key());

        Orchestrator {
            configuration: parts.configuration,
            teardown_grace: parts.teardown_grace,
            loader: parts.loader,
            cache: parts.cache,
            cache_writer,
            connectivity: parts.connectivity,
            on_unauthorized: parts.on_unauthorized,
            publisher,
            channel,
            channel_rx,
            scheduler,
            expiry_rx,
            internal_tx,
            internal_rx,
            connectivity_rx: None,
            registered: false,
            started: false,
            online: true,
            subscribers: 0,
            teardown_at: None,
            generation: 0,
            canonical: None,
            local_props: HashMap::new(),
            latest: None,
            channel_address: None,
            main_snippet_id: None,
        }
    }

    /// Runs until every handle is dropped.
    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        debug!("sync engine running for {}", self.configuration);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(event) = self.internal_rx.recv() => self.handle_internal(event).await,
                Some(event) = self.channel_rx.recv() => self.handle_channel_event(event),
                Some(action) = self.expiry_rx.recv() => self.apply_action(action, "scheduler"),
                Some(state) = connectivity_changed(&mut self.connectivity_rx) => {
                    self.handle_connectivity(state).await;
                }
                _ = teardown_timer(self.teardown_at) => self.teardown().await,
            }
        }

        self.teardown().await;
        debug!("sync engine stopped for {}", self.configuration);
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Register => {
                if self.registered {
                    debug!("{} already registered", self.configuration);
                    return;
                }
                self.registered = true;
                self.watch_connectivity();
                if self.subscribers > 0 {
                    self.start();
                }
            }
            Command::Subscribe => {
                self.subscribers += 1;
                if self.teardown_at.take().is_some() {
                    debug!("teardown cancelled by new subscriber");
                }
                if self.registered && !self.started {
                    self.start();
                }
            }
            Command::Unsubscribe => {
                self.subscribers = self.subscribers.saturating_sub(1);
                if self.subscribers == 0 && self.started {
                    debug!("last subscriber left; teardown in {:?}", self.teardown_grace);
                    self.teardown_at = Some(Instant::now() + self.teardown_grace);
                }
            }
            Command::ForceRefresh => self.refresh("forced"),
            Command::SetLocalProps { id, props } => {
                self.local_props.entry(id).or_default().extend(props);
                self.republish();
            }
            Command::MainSnippetId(reply) => {
                let _ = reply.send(self.main_snippet_id.clone());
            }
            Command::ClearCache(reply) => {
                let writer = self.cache_writer.clone();
                tokio::spawn(async move {
                    let _ = reply.send(writer.clear().await);
                });
            }
        }
    }

    fn watch_connectivity(&mut self) {
        let mut rx = self.connectivity.watch();
        self.online = rx.borrow_and_update().is_connected();
        self.connectivity_rx = Some(rx);
    }

    /// Starts a session: cache read, then the network load.
    fn start(&mut self) {
        self.started = true;
        self.teardown_at = None;
        if self.connectivity_rx.is_none() {
            self.watch_connectivity();
        }
        info!("starting sync for {}", self.configuration);

        let generation = self.generation;
        let cache = Arc::clone(&self.cache);
        let key = self.configuration.cache_key();
        let loader = Arc::clone(&self.loader);
        let configuration = self.configuration.clone();
        let tx = self.internal_tx.clone();

        tokio::spawn(async move {
            let snippets = tokio::task::spawn_blocking(move || cache.load(&key))
                .await
                .unwrap_or_else(|e| {
                    warn!("cache read failed: {}", e);
                    None
                });
            let _ = tx.send(Internal::CacheLoaded {
                generation,
                snippets,
            });
            let result = loader.load(&configuration).await;
            let _ = tx.send(Internal::Loaded { generation, result });
        });
    }

    /// Emits Progress with the last known data and reloads from the network.
    ///
    /// A load already in flight is not cancelled; whichever result arrives
    /// last wins.
    fn refresh(&mut self, reason: &str) {
        debug!("refreshing {} ({})", self.configuration, reason);
        self.publish(Outcome::progress(self.exposed()));

        let generation = self.generation;
        let loader = Arc::clone(&self.loader);
        let configuration = self.configuration.clone();
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = loader.load(&configuration).await;
            let _ = tx.send(Internal::Loaded { generation, result });
        });
    }

    async fn handle_internal(&mut self, event: Internal) {
        match event {
            Internal::CacheLoaded {
                generation,
                snippets,
            } => {
                if generation != self.generation {
                    return;
                }
                // A load that already finished supersedes the snapshot.
                if self.latest.as_ref().is_some_and(|o| !o.is_progress()) {
                    return;
                }
                if self.canonical.is_none() {
                    if let Some(snippets) = &snippets {
                        debug!("warm start with {} cached snippets", snippets.len());
                    }
                    self.canonical = snippets;
                }
                self.publish(Outcome::progress(self.exposed()));
            }
            Internal::Loaded { generation, result } => {
                if generation != self.generation {
                    debug!("dropping load result from a previous session");
                    return;
                }
                match result {
                    Ok(project) => self.on_loaded(project).await,
                    Err(e) => {
                        warn!("loading {} failed: {}", self.configuration, e);
                        self.publish(Outcome::error(Arc::new(e), self.exposed()));
                    }
                }
            }
        }
    }

    async fn on_loaded(&mut self, project: ProjectResult) {
        info!(
            "loaded {} snippets for {}",
            project.snippets.len(),
            self.configuration
        );
        self.main_snippet_id = project.main_snippet_id;
        self.cache_writer.save(project.snippets.clone());
        self.canonical = Some(project.snippets);
        self.publish(Outcome::success(self.exposed().unwrap_or_default()));

        if !self.started {
            return;
        }
        if let Some(list) = &self.canonical {
            self.scheduler.seed(project.server_time, list);
        }
        self.channel_address = Some(project.channel.clone());
        if self.online {
            self.channel
                .connect(&project.channel, self.on_unauthorized.clone())
                .await;
        }
    }

    fn handle_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Action(action) => self.apply_action(action, "channel"),
            ChannelEvent::Status(ConnectionStatus::Failed(code)) => {
                debug!("channel: {}", Error::from_channel_failure(code));
            }
            ChannelEvent::Status(status) => debug!("channel {}", status),
        }
    }

    fn apply_action(&mut self, action: UpdateAction, source: &str) {
        let Some(current) = &self.canonical else {
            debug!(
                "no snippet list yet; dropping {} {} from {}",
                action.kind, action.id, source
            );
            return;
        };

        let Some(next) = reconcile::apply(current, &action) else {
            debug!(
                "{} {} from {} changed nothing",
                action.kind, action.id, source
            );
            return;
        };

        debug!("applied {} {} from {}", action.kind, action.id, source);
        self.cache_writer.save(next.clone());
        if self.started {
            self.scheduler.update_and_schedule_next(&next);
        }
        self.canonical = Some(next);
        self.republish();
    }

    async fn handle_connectivity(&mut self, state: Connectivity) {
        let online = state.is_connected();
        if online == self.online {
            return;
        }
        self.online = online;
        info!("connectivity {}", state);

        if !self.started {
            return;
        }
        match state {
            Connectivity::Disconnected => {
                self.channel.disconnect().await;
            }
            Connectivity::Connected => {
                if let Some(address) = self.channel_address.clone() {
                    self.channel
                        .connect(&address, self.on_unauthorized.clone())
                        .await;
                }
                self.refresh("connectivity restored");
            }
        }
    }

    async fn teardown(&mut self) {
        self.teardown_at = None;
        if !self.started {
            return;
        }
        info!("tearing down sync for {}", self.configuration);

        self.started = false;
        self.generation += 1;
        self.channel.disconnect().await;
        self.scheduler.cancel();
        self.connectivity_rx = None;

        // Local overrides survive; the next session starts from the cache.
        self.canonical = None;
        self.latest = None;
        self.channel_address = None;
        self.publisher.clear();
    }

    /// Canonical list with local overrides applied.
    fn exposed(&self) -> Option<Vec<Snippet>> {
        self.canonical
            .as_ref()
            .map(|list| reconcile::overlay(list, &self.local_props))
    }

    /// Re-emits the current outcome with fresh data, if the data changed.
    fn republish(&mut self) {
        let Some(latest) = &self.latest else {
            return;
        };
        let data = self.exposed();
        if latest.data() == data.as_ref() {
            return;
        }
        let outcome = latest.with_data(data);
        self.publish(outcome);
    }

    fn publish(&mut self, outcome: SyncOutcome) {
        self.latest = Some(outcome.clone());
        self.publisher.publish(outcome);
    }
}

async fn connectivity_changed(
    rx: &mut Option<watch::Receiver<Connectivity>>,
) -> Option<Connectivity> {
    let rx = rx.as_mut()?;
    rx.changed().await.ok()?;
    let state = *rx.borrow_and_update();
    Some(state)
}

async fn teardown_timer(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
