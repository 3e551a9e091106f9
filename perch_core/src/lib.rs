#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Seat presence detection (hardware-agnostic).
//!
//! All hardware interaction goes through `perch_traits::Sensor` and
//! `perch_traits::Speaker`.
//!
//! ## Architecture
//!
//! - **Calibration**: baseline and presence threshold from an empty seat (`calibration`)
//! - **Presence**: burst majority voting and burst averaging (`presence`)
//! - **Occupancy**: edge-triggered state machine, one trigger per sitting (`occupancy`)
//! - **Watcher**: the polling loop tying it together (`watcher`, built via `builder`)
//! - **Playback**: optional detached speaker thread (`playback`)
//! - **Events**: `EventSink` for sitting/speaking events (`logger`)

pub mod builder;
pub mod calibration;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod logger;
pub mod mocks;
pub mod occupancy;
pub mod phrases;
pub mod playback;
pub mod presence;
pub mod watcher;

pub use builder::{DEFAULT_POLL_INTERVAL, Missing, Set, WatcherBuilder};
pub use calibration::{Calibration, CalibrationParams, Threshold, calibrate};
pub use error::{BuildError, CalibrationError, PerchError};
pub use logger::{EventSink, JsonlSink, NullSink, TracingSink, WatchEvent};
pub use occupancy::{OccupancyMachine, OccupancyState, Trigger};
pub use phrases::PhrasePicker;
pub use playback::DetachedSpeaker;
pub use presence::{
    DetectionMode, DetectionParams, detect, majority, sample_occupied, sample_occupied_averaged,
};
pub use watcher::{RunSummary, Watcher};
