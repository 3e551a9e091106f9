//! `From` implementations bridging `perch_config` sections to core parameters.

use std::time::Duration;

use crate::calibration::CalibrationParams;
use crate::presence::{DetectionMode, DetectionParams};

impl From<perch_config::DetectionMode> for DetectionMode {
    fn from(m: perch_config::DetectionMode) -> Self {
        match m {
            perch_config::DetectionMode::Averaged => Self::Averaged,
            perch_config::DetectionMode::Single => Self::Single,
        }
    }
}

impl From<&perch_config::DetectionCfg> for DetectionParams {
    fn from(c: &perch_config::DetectionCfg) -> Self {
        Self {
            mode: c.mode.into(),
            burst_size: c.burst_size,
            bursts: c.bursts,
        }
    }
}

impl From<&perch_config::CalibrationCfg> for CalibrationParams {
    fn from(c: &perch_config::CalibrationCfg) -> Self {
        Self {
            margin_multiplier: c.margin_multiplier,
            samples: c.samples,
        }
    }
}

/// Pause between polls from `[runner]`.
pub fn poll_interval(c: &perch_config::RunnerCfg) -> Duration {
    Duration::from_millis(c.poll_interval_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_core_defaults() {
        let cfg = perch_config::load_toml("[serial]\ndevice = \"/dev/null\"\n").unwrap();
        assert_eq!(DetectionParams::from(&cfg.detection), DetectionParams::default());
        assert_eq!(
            CalibrationParams::from(&cfg.calibration),
            CalibrationParams::default()
        );
        assert_eq!(poll_interval(&cfg.runner), crate::DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn single_mode_maps_through() {
        let cfg = perch_config::load_toml(
            "[serial]\ndevice = \"/dev/null\"\n[detection]\nmode = \"single\"\nburst_size = 4\n",
        )
        .unwrap();
        let p = DetectionParams::from(&cfg.detection);
        assert_eq!(p.mode, DetectionMode::Single);
        assert_eq!(p.burst_size, 4);
    }
}
