//! Seams shared by every perch crate: the sensor that answers reading
//! requests, the speaker that voices a phrase, and the clock the polling
//! loop paces itself with.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// One raw sample from the remote analog sensor.
///
/// The valid domain is `[0, ADC_MAX)`. A corrupt reply may parse to a larger
/// value; it is carried as-is so callers can reject it.
pub type Reading = u32;

/// Exclusive upper bound of the sensor's 16-bit range.
pub const ADC_MAX: Reading = 1 << 16;
/// Half of the ADC range; the ceiling for any presence threshold.
pub const ADC_HALF: Reading = 1 << 15;

/// A source of readings that answers one request with one value.
///
/// The remote protocol carries no correlation id, so an implementation must
/// be exclusively owned: request/response pairs can never interleave.
pub trait Sensor {
    /// Send one request and wait for its reply. Every failure (write error,
    /// timeout, unparseable reply) collapses to `None`.
    fn request_and_read(&mut self) -> Option<Reading>;
}

impl<S: Sensor + ?Sized> Sensor for Box<S> {
    fn request_and_read(&mut self) -> Option<Reading> {
        (**self).request_and_read()
    }
}

/// Something that can voice a phrase, typically to completion.
pub trait Speaker {
    fn speak(&mut self, text: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<P: Speaker + ?Sized> Speaker for Box<P> {
    fn speak(&mut self, text: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).speak(text)
    }
}
