//! Watch events and where they go.
//!
//! The watcher never installs a global subscriber. It reports what happened
//! through an injected [`EventSink`]; the binary decides whether that means
//! `tracing` output, a JSON-lines file, or both.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use perch_traits::Reading;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Calibrated { baseline: Reading, threshold: Reading },
    SatDown { sitting: u64 },
    Spoke { sitting: u64, phrase: String },
    SpeakFailed { sitting: u64, phrase: String, error: String },
    StoodUp,
}

impl WatchEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Calibrated { .. } => "calibrated",
            Self::SatDown { .. } => "sat_down",
            Self::Spoke { .. } => "spoke",
            Self::SpeakFailed { .. } => "speak_failed",
            Self::StoodUp => "stood_up",
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Calibrated {
                baseline,
                threshold,
            } => json!({ "event": self.name(), "baseline": baseline, "threshold": threshold }),
            Self::SatDown { sitting } => json!({ "event": self.name(), "sitting": sitting }),
            Self::Spoke { sitting, phrase } => {
                json!({ "event": self.name(), "sitting": sitting, "phrase": phrase })
            }
            Self::SpeakFailed {
                sitting,
                phrase,
                error,
            } => json!({
                "event": self.name(),
                "sitting": sitting,
                "phrase": phrase,
                "error": error,
            }),
            Self::StoodUp => json!({ "event": self.name() }),
        }
    }
}

pub trait EventSink {
    fn record(&self, event: &WatchEvent);
}

impl<T: EventSink + ?Sized> EventSink for Box<T> {
    fn record(&self, event: &WatchEvent) {
        (**self).record(event);
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn record(&self, event: &WatchEvent) {
        (**self).record(event);
    }
}

/// Fan out to every sink in order.
impl<T: EventSink> EventSink for Vec<T> {
    fn record(&self, event: &WatchEvent) {
        for sink in self {
            sink.record(event);
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &WatchEvent) {}
}

/// Forwards events to `tracing` at info level (warn for failures).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &WatchEvent) {
        match event {
            WatchEvent::Calibrated {
                baseline,
                threshold,
            } => tracing::info!(baseline, threshold, "watching with calibrated threshold"),
            WatchEvent::SatDown { sitting } => tracing::info!(sitting, "someone sat down"),
            WatchEvent::Spoke { sitting, phrase } => tracing::info!(sitting, %phrase, "spoke"),
            WatchEvent::SpeakFailed {
                sitting,
                phrase,
                error,
            } => tracing::warn!(sitting, %phrase, %error, "could not speak"),
            WatchEvent::StoodUp => tracing::debug!("seat vacated"),
        }
    }
}

/// Appends one JSON object per event to a file.
///
/// Write failures are swallowed: losing an event line must not stop the
/// watcher.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().min(u128::from(u64::MAX)) as u64)
        .unwrap_or(0)
}

impl EventSink for JsonlSink {
    fn record(&self, event: &WatchEvent) {
        let mut line = event.to_json();
        if let Value::Object(map) = &mut line {
            map.insert("ts_ms".into(), json!(unix_millis()));
        }
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
        {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{line}") {
                    tracing::debug!(error = %e, path = %self.path.display(), "event write failed");
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, path = %self.path.display(), "event file unavailable");
            }
        }
    }
}
