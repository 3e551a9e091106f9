use perch_traits::{ADC_HALF, Reading};
use thiserror::Error;

/// Why startup calibration could not produce a threshold. Every variant is
/// fatal: there is no safe default threshold.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("bad calibration reading at sample {index}: {reading:?}")]
    BadReading {
        index: usize,
        reading: Option<Reading>,
    },
    #[error("no calibration samples collected")]
    NoSamples,
    #[error("threshold {0} is outside 0..={max}", max = ADC_HALF)]
    ThresholdOutOfRange(u64),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PerchError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("no cached clip for {0:?}")]
    MissingClip(String),
    #[error("playback failed: {0}")]
    Playback(String),
    #[error("playback busy; phrase dropped")]
    PlaybackBusy,
    #[error("calibration failed: {0}")]
    Calibration(#[from] CalibrationError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing calibration")]
    MissingCalibration,
    #[error("no phrases to say")]
    NoPhrases,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
