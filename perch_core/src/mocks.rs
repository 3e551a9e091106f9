//! Test doubles for perch_core and its dependents.
//!
//! Shared by the unit tests, the integration tests under `tests/`, and the
//! CLI's dry runs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use perch_traits::{Clock, Reading, Sensor, Speaker};

use crate::logger::{EventSink, WatchEvent};

/// Replays a fixed list of replies, then reports every later reading as
/// missing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensor {
    replies: VecDeque<Option<Reading>>,
    served: usize,
}

impl ScriptedSensor {
    pub fn new(replies: impl IntoIterator<Item = Option<Reading>>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            served: 0,
        }
    }

    pub fn from_readings(readings: impl IntoIterator<Item = Reading>) -> Self {
        Self::new(readings.into_iter().map(Some))
    }

    pub fn repeat(value: Reading, n: usize) -> Self {
        Self::new(std::iter::repeat_n(Some(value), n))
    }

    /// Append more replies after the current script.
    pub fn then(mut self, replies: impl IntoIterator<Item = Option<Reading>>) -> Self {
        self.replies.extend(replies);
        self
    }

    /// Requests answered so far, including missing replies.
    pub fn served(&self) -> usize {
        self.served
    }

    pub fn remaining(&self) -> usize {
        self.replies.len()
    }
}

impl Sensor for ScriptedSensor {
    fn request_and_read(&mut self) -> Option<Reading> {
        self.served += 1;
        self.replies.pop_front().flatten()
    }
}

/// Records every phrase it is asked to say. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the phrase, then reports a playback failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.spoken)
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&mut self, text: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut g) = self.spoken.lock() {
            g.push(text.to_string());
        }
        if self.fail {
            return Err(Box::new(std::io::Error::other("speaker unplugged")));
        }
        Ok(())
    }
}

/// Deterministic clock whose time only moves when slept on or advanced.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }

    /// Total simulated time slept or advanced.
    pub fn elapsed(&self) -> Duration {
        self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

/// Keeps every event in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<WatchEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WatchEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(WatchEvent::name).collect()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &WatchEvent) {
        if let Ok(mut g) = self.events.lock() {
            g.push(event.clone());
        }
    }
}
