//! Type-state builder for `Watcher`.
//!
//! The builder enforces at compile time that a Sensor and a Speaker are
//! provided before `build()` is available. `try_build()` is always available
//! for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use perch_traits::{Clock, MonotonicClock, Sensor, Speaker};

use crate::calibration::Calibration;
use crate::error::{BuildError, Result};
use crate::logger::{EventSink, TracingSink};
use crate::occupancy::OccupancyMachine;
use crate::phrases::PhrasePicker;
use crate::presence::DetectionParams;
use crate::watcher::Watcher;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Watcher`. Everything is validated on `build()`.
pub struct WatcherBuilder<S, P> {
    sensor: Option<Box<dyn Sensor>>,
    speaker: Option<Box<dyn Speaker>>,
    calibration: Option<Calibration>,
    detection: Option<DetectionParams>,
    poll_interval: Option<Duration>,
    phrases: Vec<String>,
    seed: Option<u64>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    sink: Option<Box<dyn EventSink>>,
    _s: PhantomData<S>,
    _p: PhantomData<P>,
}

impl Default for WatcherBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            sensor: None,
            speaker: None,
            calibration: None,
            detection: None,
            poll_interval: None,
            phrases: Vec::new(),
            seed: None,
            clock: None,
            sink: None,
            _s: PhantomData,
            _p: PhantomData,
        }
    }
}

impl<S, P> WatcherBuilder<S, P> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<Watcher> {
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::InvalidConfig("sensor not set")))?;
        let speaker = self
            .speaker
            .ok_or_else(|| eyre::Report::new(BuildError::InvalidConfig("speaker not set")))?;
        let calibration = self
            .calibration
            .ok_or_else(|| eyre::Report::new(BuildError::MissingCalibration))?;

        let detection = self.detection.unwrap_or_default();
        if detection.burst_size == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "burst_size must be >= 1",
            )));
        }
        if detection.bursts == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "bursts must be >= 1",
            )));
        }
        let poll_interval = self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval > MAX_POLL_INTERVAL {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "poll interval must be <= 60s",
            )));
        }

        let picker = match self.seed {
            Some(seed) => PhrasePicker::seeded(self.phrases, seed),
            None => PhrasePicker::new(self.phrases),
        }
        .map_err(eyre::Report::new)?;

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };
        let sink: Box<dyn EventSink> = match self.sink {
            Some(s) => s,
            None => Box::new(TracingSink),
        };

        Ok(Watcher {
            sensor,
            speaker,
            calibration,
            detection,
            poll_interval,
            picker,
            occupancy: OccupancyMachine::new(),
            clock,
            sink,
            polls: 0,
            speak_failures: 0,
        })
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self
    }
    pub fn with_detection(mut self, detection: DetectionParams) -> Self {
        self.detection = Some(detection);
        self
    }
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }
    pub fn with_phrases<I, T>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.phrases = phrases.into_iter().map(Into::into).collect();
        self
    }
    /// Fix the phrase picker's seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }
    /// Where watch events go; defaults to `TracingSink`.
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }
}

// Setters that advance type-state
impl<P> WatcherBuilder<Missing, P> {
    pub fn with_sensor(self, sensor: impl Sensor + 'static) -> WatcherBuilder<Set, P> {
        WatcherBuilder {
            sensor: Some(Box::new(sensor)),
            speaker: self.speaker,
            calibration: self.calibration,
            detection: self.detection,
            poll_interval: self.poll_interval,
            phrases: self.phrases,
            seed: self.seed,
            clock: self.clock,
            sink: self.sink,
            _s: PhantomData,
            _p: PhantomData,
        }
    }
}

impl<S> WatcherBuilder<S, Missing> {
    pub fn with_speaker(self, speaker: impl Speaker + 'static) -> WatcherBuilder<S, Set> {
        WatcherBuilder {
            sensor: self.sensor,
            speaker: Some(Box::new(speaker)),
            calibration: self.calibration,
            detection: self.detection,
            poll_interval: self.poll_interval,
            phrases: self.phrases,
            seed: self.seed,
            clock: self.clock,
            sink: self.sink,
            _s: PhantomData,
            _p: PhantomData,
        }
    }
}

impl WatcherBuilder<Set, Set> {
    /// Validate and build. Only available once a Sensor and Speaker are set.
    pub fn build(self) -> Result<Watcher> {
        self.try_build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::Threshold;
    use crate::mocks::{RecordingSpeaker, ScriptedSensor};

    fn cal() -> Calibration {
        Calibration::fixed(Threshold::new(1000).unwrap())
    }

    fn build_err(b: WatcherBuilder<Set, Set>) -> BuildError {
        let report = b.build().err().unwrap();
        report.downcast_ref::<BuildError>().cloned().unwrap()
    }

    #[test]
    fn missing_calibration_is_reported() {
        let b = Watcher::builder()
            .with_sensor(ScriptedSensor::default())
            .with_speaker(RecordingSpeaker::new())
            .with_phrases(["hi"]);
        assert_eq!(build_err(b), BuildError::MissingCalibration);
    }

    #[test]
    fn empty_phrases_are_rejected() {
        let b = Watcher::builder()
            .with_sensor(ScriptedSensor::default())
            .with_speaker(RecordingSpeaker::new())
            .with_calibration(cal());
        assert_eq!(build_err(b), BuildError::NoPhrases);
    }

    #[test]
    fn zero_sized_bursts_are_rejected() {
        let b = Watcher::builder()
            .with_sensor(ScriptedSensor::default())
            .with_speaker(RecordingSpeaker::new())
            .with_calibration(cal())
            .with_phrases(["hi"])
            .with_detection(DetectionParams {
                burst_size: 0,
                ..DetectionParams::default()
            });
        assert!(matches!(build_err(b), BuildError::InvalidConfig(_)));
    }

    #[test]
    fn try_build_without_sensor_fails() {
        let err = Watcher::builder()
            .with_calibration(cal())
            .with_phrases(["hi"])
            .try_build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("sensor"), "{err}");
    }

    #[test]
    fn complete_builder_builds() {
        let w = Watcher::builder()
            .with_sensor(ScriptedSensor::default())
            .with_speaker(RecordingSpeaker::new())
            .with_calibration(cal())
            .with_phrases(vec!["hi".to_string()])
            .build()
            .unwrap();
        assert_eq!(w.calibration(), cal());
        assert_eq!(w.poll_interval(), DEFAULT_POLL_INTERVAL);
    }
}
