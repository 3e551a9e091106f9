//! Burst majority voting and burst averaging.
//!
//! One burst turns a run of raw readings into one boolean vote; the averaged
//! decision takes a vote over several bursts. A burst with a missing reading
//! never asserts presence.

use perch_traits::Sensor;
use tracing::{debug, trace};

use crate::calibration::Threshold;

pub const DEFAULT_BURST_SIZE: usize = 10;
pub const DEFAULT_BURSTS: usize = 10;

/// True iff `count_true` is strictly more than half of `total`.
///
/// An exact split is "not occupied": 5 of 10 is false, 6 of 10 is true.
/// An empty tally is false.
#[inline]
pub fn majority(count_true: usize, total: usize) -> bool {
    count_true.saturating_mul(2) > total
}

/// Vote over one burst of `num_readings` readings.
///
/// Returns `None` if any reading is missing (the whole burst is discarded)
/// or if `num_readings` is zero. Callers must treat `None` as not occupied.
pub fn sample_occupied<S: Sensor + ?Sized>(
    sensor: &mut S,
    threshold: Threshold,
    num_readings: usize,
) -> Option<bool> {
    if num_readings == 0 {
        return None;
    }
    let mut above = 0usize;
    for at in 0..num_readings {
        let Some(reading) = sensor.request_and_read() else {
            debug!(at, num_readings, "burst discarded: missing reading");
            return None;
        };
        if threshold.is_exceeded_by(reading) {
            above += 1;
        }
    }
    let occupied = majority(above, num_readings);
    trace!(above, num_readings, occupied, "burst vote");
    Some(occupied)
}

/// Vote over `bursts` bursts of `burst_size` readings each; a discarded
/// burst votes "not occupied".
pub fn sample_occupied_averaged<S: Sensor + ?Sized>(
    sensor: &mut S,
    threshold: Threshold,
    burst_size: usize,
    bursts: usize,
) -> bool {
    let mut occupied = 0usize;
    for _ in 0..bursts {
        if sample_occupied(sensor, threshold, burst_size).unwrap_or(false) {
            occupied += 1;
        }
    }
    let decision = majority(occupied, bursts);
    trace!(occupied, bursts, decision, "averaged vote");
    decision
}

/// How the watcher turns readings into one decision per poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionMode {
    /// Majority over `bursts` bursts
    #[default]
    Averaged,
    /// A single burst
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionParams {
    pub mode: DetectionMode,
    pub burst_size: usize,
    pub bursts: usize,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            mode: DetectionMode::Averaged,
            burst_size: DEFAULT_BURST_SIZE,
            bursts: DEFAULT_BURSTS,
        }
    }
}

impl DetectionParams {
    /// Readings consumed by one decision.
    pub fn readings_per_decision(&self) -> usize {
        match self.mode {
            DetectionMode::Averaged => self.burst_size.saturating_mul(self.bursts),
            DetectionMode::Single => self.burst_size,
        }
    }
}

/// One debounced decision according to `params.mode`.
pub fn detect<S: Sensor + ?Sized>(
    sensor: &mut S,
    threshold: Threshold,
    params: &DetectionParams,
) -> bool {
    match params.mode {
        DetectionMode::Averaged => {
            sample_occupied_averaged(sensor, threshold, params.burst_size, params.bursts)
        }
        DetectionMode::Single => {
            sample_occupied(sensor, threshold, params.burst_size).unwrap_or(false)
        }
    }
}
