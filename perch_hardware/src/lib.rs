//! Device side of perch: the serial channel adapter, a scripted simulator,
//! and the speakers.
//!
//! Serial support needs the `hardware` feature; clip playback needs `audio`.

#[cfg(feature = "audio")]
pub mod audio;
pub mod error;
pub mod serial;
pub mod sim;
pub mod speaker;

pub use perch_traits::{Reading, Sensor, Speaker};

#[cfg(feature = "audio")]
pub use audio::RodioSpeaker;
pub use error::HwError;
pub use serial::{SerialSensor, parse_first_reading};
pub use sim::SimulatedSensor;
pub use speaker::{ClipLibrary, LogSpeaker, clip_key};
