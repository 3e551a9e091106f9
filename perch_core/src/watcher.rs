//! The polling loop: detect, debounce, speak.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use perch_traits::{Clock, Sensor, Speaker};

use crate::builder::{Missing, WatcherBuilder};
use crate::calibration::Calibration;
use crate::hw_error::map_hw_error;
use crate::logger::{EventSink, WatchEvent};
use crate::occupancy::{OccupancyMachine, OccupancyState, Trigger};
use crate::phrases::PhrasePicker;
use crate::presence::{DetectionParams, detect};

/// Counters for one `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub polls: u64,
    pub triggers: u64,
    pub speak_failures: u64,
}

/// Owns the sensor and speaker for the lifetime of the process. Built with
/// [`Watcher::builder`].
pub struct Watcher {
    pub(crate) sensor: Box<dyn Sensor>,
    pub(crate) speaker: Box<dyn Speaker>,
    pub(crate) calibration: Calibration,
    pub(crate) detection: DetectionParams,
    pub(crate) poll_interval: Duration,
    pub(crate) picker: PhrasePicker,
    pub(crate) occupancy: OccupancyMachine,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) sink: Box<dyn EventSink>,
    pub(crate) polls: u64,
    pub(crate) speak_failures: u64,
}

impl core::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Watcher")
            .field("calibration", &self.calibration)
            .field("detection", &self.detection)
            .field("poll_interval", &self.poll_interval)
            .field("state", &self.occupancy.state())
            .field("sittings", &self.occupancy.sittings())
            .finish_non_exhaustive()
    }
}

impl Watcher {
    pub fn builder() -> WatcherBuilder<Missing, Missing> {
        WatcherBuilder::default()
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn occupancy_state(&self) -> OccupancyState {
        self.occupancy.state()
    }

    /// One detection cycle. On the rising edge a phrase is picked and spoken;
    /// a speaker failure is recorded and otherwise ignored.
    pub fn poll_once(&mut self) -> Option<Trigger> {
        self.polls += 1;
        let was = self.occupancy.state();
        let occupied = detect(
            self.sensor.as_mut(),
            self.calibration.threshold,
            &self.detection,
        );
        let trigger = self.occupancy.observe(occupied);

        match trigger {
            Some(t) => {
                self.sink.record(&WatchEvent::SatDown { sitting: t.sitting });
                self.speak(t);
            }
            None if was == OccupancyState::Occupied && !occupied => {
                self.sink.record(&WatchEvent::StoodUp);
            }
            None => {}
        }
        trigger
    }

    fn speak(&mut self, trigger: Trigger) {
        let phrase = self.picker.pick().to_string();
        match self.speaker.speak(&phrase) {
            Ok(()) => self.sink.record(&WatchEvent::Spoke {
                sitting: trigger.sitting,
                phrase,
            }),
            Err(e) => {
                self.speak_failures += 1;
                let error = map_hw_error(e.as_ref());
                self.sink.record(&WatchEvent::SpeakFailed {
                    sitting: trigger.sitting,
                    phrase,
                    error: error.to_string(),
                });
            }
        }
    }

    /// Poll until `shutdown` is set or `max_polls` polls have run, sleeping
    /// the poll interval between polls.
    pub fn run(&mut self, shutdown: &AtomicBool, max_polls: Option<u64>) -> RunSummary {
        self.sink.record(&WatchEvent::Calibrated {
            baseline: self.calibration.baseline,
            threshold: self.calibration.threshold.get(),
        });
        let start_polls = self.polls;
        let start_failures = self.speak_failures;
        let mut triggers = 0u64;

        loop {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("shutdown requested; leaving poll loop");
                break;
            }
            let polls = self.polls - start_polls;
            if max_polls.is_some_and(|max| polls >= max) {
                tracing::debug!(polls, "poll limit reached");
                break;
            }
            if self.poll_once().is_some() {
                triggers += 1;
            }
            self.clock.sleep(self.poll_interval);
        }

        RunSummary {
            polls: self.polls - start_polls,
            triggers,
            speak_failures: self.speak_failures - start_failures,
        }
    }
}
