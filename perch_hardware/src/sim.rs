//! Scripted stand-in for the remote sampler, used when no rig is attached.

use perch_traits::{Reading, Sensor};

use crate::error::{HwError, Result};

/// Replays a fixed sequence of replies, cycling forever.
///
/// Script syntax: comma-separated entries, each `VALUE` or `VALUExCOUNT`;
/// `-` in place of a value is a dropped reply. `"1000x100,5000x40,-"` gives
/// 100 readings of 1000, 40 of 5000, one missing reply, then starts over.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    script: Vec<Option<Reading>>,
    pos: usize,
}

impl SimulatedSensor {
    /// A seat that always reports the same value.
    pub fn constant(value: Reading) -> Self {
        Self {
            script: vec![Some(value)],
            pos: 0,
        }
    }

    pub fn from_script(script: &str) -> Result<Self> {
        let mut out = Vec::new();
        for entry in script.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (value, count) = match entry.split_once('x') {
                Some((v, n)) => {
                    let n = n
                        .trim()
                        .parse::<usize>()
                        .map_err(|e| HwError::Script(format!("{entry:?}: bad count: {e}")))?;
                    (v.trim(), n)
                }
                None => (entry, 1),
            };
            if count == 0 {
                return Err(HwError::Script(format!("{entry:?}: count must be >= 1")));
            }
            let reading = if value == "-" {
                None
            } else {
                Some(
                    value
                        .parse::<Reading>()
                        .map_err(|e| HwError::Script(format!("{entry:?}: bad value: {e}")))?,
                )
            };
            out.extend(std::iter::repeat_n(reading, count));
        }
        if out.is_empty() {
            return Err(HwError::Script("script has no entries".into()));
        }
        Ok(Self {
            script: out,
            pos: 0,
        })
    }

    /// Number of replies served so far.
    pub fn served(&self) -> usize {
        self.pos
    }
}

impl Sensor for SimulatedSensor {
    fn request_and_read(&mut self) -> Option<Reading> {
        let value = self.script[self.pos % self.script.len()];
        self.pos = self.pos.wrapping_add(1);
        tracing::trace!(?value, "simulated reading");
        value
    }
}
