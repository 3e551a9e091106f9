//! Startup self-calibration.
//!
//! The seat is assumed empty while calibrating. The truncating mean of a run
//! of readings is the "absent" baseline; the baseline scaled by a margin
//! multiplier becomes the presence threshold, capped at half the ADC range.

use std::fmt;

use perch_traits::{ADC_HALF, ADC_MAX, Reading, Sensor};
use tracing::{info, warn};

use crate::error::CalibrationError;

pub const DEFAULT_MARGIN_MULTIPLIER: u32 = 4;
pub const DEFAULT_CALIBRATION_SAMPLES: usize = 100;

/// Reading value above which the seat counts as occupied.
///
/// Invariant: `0 <= threshold <= ADC_HALF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Threshold(Reading);

impl Threshold {
    pub fn new(value: u64) -> Result<Self, CalibrationError> {
        if value > u64::from(ADC_HALF) {
            return Err(CalibrationError::ThresholdOutOfRange(value));
        }
        Ok(Self(value as Reading))
    }

    #[inline]
    pub fn get(self) -> Reading {
        self.0
    }

    /// Strictly above: a reading equal to the threshold is "absent".
    #[inline]
    pub fn is_exceeded_by(self, reading: Reading) -> bool {
        reading > self.0
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of a successful calibration, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    /// Truncating mean of the calibration readings
    pub baseline: Reading,
    pub threshold: Threshold,
}

impl Calibration {
    /// A calibration from an operator-supplied threshold, skipping the
    /// sampling run. The baseline is unknown and reported as 0.
    pub fn fixed(threshold: Threshold) -> Self {
        Self {
            baseline: 0,
            threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationParams {
    pub margin_multiplier: u32,
    pub samples: usize,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            margin_multiplier: DEFAULT_MARGIN_MULTIPLIER,
            samples: DEFAULT_CALIBRATION_SAMPLES,
        }
    }
}

impl CalibrationParams {
    pub fn run<S: Sensor + ?Sized>(&self, sensor: &mut S) -> Result<Calibration, CalibrationError> {
        calibrate(sensor, self.margin_multiplier, self.samples)
    }
}

/// Take `num_samples` readings and derive the presence threshold.
///
/// A single missing or out-of-range reading invalidates the whole run; no
/// partial averaging is attempted.
pub fn calibrate<S: Sensor + ?Sized>(
    sensor: &mut S,
    margin_multiplier: u32,
    num_samples: usize,
) -> Result<Calibration, CalibrationError> {
    let mut sum: u64 = 0;
    let mut count: u64 = 0;
    for index in 0..num_samples {
        match sensor.request_and_read() {
            Some(value) if value <= ADC_MAX => {
                sum += u64::from(value);
                count += 1;
            }
            reading => {
                warn!(index, ?reading, "bad calibration reading; aborting calibration");
                return Err(CalibrationError::BadReading { index, reading });
            }
        }
    }
    if count == 0 {
        return Err(CalibrationError::NoSamples);
    }

    let baseline = sum / count;
    let mut threshold = baseline * u64::from(margin_multiplier);
    if threshold > u64::from(ADC_HALF) {
        warn!(
            baseline,
            raw_threshold = threshold,
            "threshold above half the ADC range; is someone already sitting on the seat?"
        );
        threshold = u64::from(ADC_HALF);
    }
    // Unreachable after the clamp above; kept as a guard on the ADC range.
    if threshold > u64::from(ADC_MAX) {
        warn!(
            raw_threshold = threshold,
            "calibration exceeds ADC accuracy; defaulting to {ADC_HALF}"
        );
        threshold = u64::from(ADC_HALF);
    }

    let threshold = Threshold::new(threshold)?;
    // Every sample was <= ADC_MAX, so the mean fits a Reading.
    let baseline = baseline as Reading;
    info!(baseline, threshold = threshold.get(), samples = count, "calibrated");
    Ok(Calibration {
        baseline,
        threshold,
    })
}
