// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local expiry of snippets whose visibility window has ended.
//!
//! Expiry instants are server times. The scheduler converts them with the
//! clock offset captured by [`VisibilityScheduler::seed`], so a device clock
//! that runs ahead or behind the backend does not shift expiries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use snip_core::{ClockOffset, ClockSource, Snippet, UpdateAction};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Emits a DELETED action for each snippet once its `visibleUntil` passes.
pub struct VisibilityScheduler {
    clock: Arc<dyn ClockSource>,
    offset: Option<ClockOffset>,
    expiry_tx: mpsc::UnboundedSender<UpdateAction>,
    pending: Option<CancellationToken>,
}

impl VisibilityScheduler {
    /// Creates an unseeded scheduler.
    ///
    /// Returns the scheduler and a receiver for the actions it emits.
    pub fn new(clock: Arc<dyn ClockSource>) -> (Self, mpsc::UnboundedReceiver<UpdateAction>) {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let scheduler = VisibilityScheduler {
            clock,
            offset: None,
            expiry_tx,
            pending: None,
        };
        (scheduler, expiry_rx)
    }

    /// Captures the clock offset from a server timestamp and schedules
    /// expiries for `list`.
    ///
    /// The offset is kept even when `list` is empty.
    pub fn seed(&mut self, server_now: DateTime<Utc>, list: &[Snippet]) -> Option<DateTime<Utc>> {
        let offset = ClockOffset::capture(server_now, self.clock.now());
        debug!("clock offset {}ms", offset.as_duration().num_milliseconds());
        self.offset = Some(offset);
        self.update_and_schedule_next(list)
    }

    pub fn offset(&self) -> Option<ClockOffset> {
        self.offset
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Replaces any pending wake-up with one for the nearest expiry in
    /// `list`.
    ///
    /// Returns the scheduled instant in server time, or `None` when nothing
    /// in `list` expires or the scheduler has not been seeded.
    pub fn update_and_schedule_next(&mut self, list: &[Snippet]) -> Option<DateTime<Utc>> {
        self.cancel();

        let Some(offset) = self.offset else {
            debug!("scheduler not seeded; ignoring update");
            return None;
        };

        let windows: Vec<(String, DateTime<Utc>)> = list
            .iter()
            .filter_map(|s| s.visible_until.map(|until| (s.id.clone(), until)))
            .collect();
        let next = windows.iter().map(|(_, until)| *until).min()?;

        let token = CancellationToken::new();
        tokio::spawn(wake(
            windows,
            offset,
            Arc::clone(&self.clock),
            self.expiry_tx.clone(),
            token.clone(),
        ));
        self.pending = Some(token);
        debug!("next expiry at {}", next);
        Some(next)
    }

    /// Cancels the pending wake-up, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl Drop for VisibilityScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn wake(
    mut windows: Vec<(String, DateTime<Utc>)>,
    offset: ClockOffset,
    clock: Arc<dyn ClockSource>,
    expiry_tx: mpsc::UnboundedSender<UpdateAction>,
    cancel: CancellationToken,
) {
    loop {
        let Some(next) = windows.iter().map(|(_, until)| *until).min() else {
            return;
        };
        let delay = (next - offset.server_now(clock.as_ref()))
            .to_std()
            .unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }

        // Re-evaluate: several windows may have closed together.
        let now = offset.server_now(clock.as_ref());
        let (expired, remaining): (Vec<_>, Vec<_>) =
            windows.into_iter().partition(|(_, until)| *until <= now);
        windows = remaining;

        for (id, until) in expired {
            info!("snippet {} expired at {}", id, until);
            if expiry_tx.send(UpdateAction::deleted(id)).is_err() {
                return;
            }
        }
    }
}
