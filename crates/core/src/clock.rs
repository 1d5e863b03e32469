// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Device clock and server clock-skew correction.
//!
//! The server reports its time on every snapshot response. The offset
//! `server_now - device_now` is captured once per response and used to
//! translate device time into server time when scheduling local expiries.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Trait for getting the current device time.
///
/// This allows injecting a fake clock for testing.
pub trait ClockSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: ClockSource> ClockSource for &C {
    fn now(&self) -> DateTime<Utc> {
        (*self).now()
    }
}

impl<C: ClockSource + ?Sized> ClockSource for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// A manually driven clock.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        ManualClock {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Difference between server-reported time and device time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockOffset(Duration);

impl ClockOffset {
    /// Captures `server_now - device_now`.
    pub fn capture(server_now: DateTime<Utc>, device_now: DateTime<Utc>) -> Self {
        ClockOffset(server_now - device_now)
    }

    pub fn zero() -> Self {
        ClockOffset(Duration::zero())
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Translates a device instant into server time.
    pub fn to_server(&self, device: DateTime<Utc>) -> DateTime<Utc> {
        device + self.0
    }

    /// Translates a server instant into device time.
    pub fn to_device(&self, server: DateTime<Utc>) -> DateTime<Utc> {
        server - self.0
    }

    /// Current server time according to `clock`.
    pub fn server_now(&self, clock: &dyn ClockSource) -> DateTime<Utc> {
        self.to_server(clock.now())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
