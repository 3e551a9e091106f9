#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and phrase-set loading for perch.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - `PhraseSet` is a JSON object mapping a set key to its phrases.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Serial {
    /// Path to the UART the remote sampler is wired to
    pub device: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// How long a single reply may take before the reading counts as missing
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

const fn default_baud() -> u32 {
    9600
}

const fn default_read_timeout_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Baseline is multiplied by this to get the presence threshold
    pub margin_multiplier: u32,
    /// Readings averaged into the baseline
    pub samples: usize,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            margin_multiplier: 4,
            samples: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Majority of several bursts
    #[default]
    Averaged,
    /// One burst per poll
    Single,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DetectionCfg {
    pub mode: DetectionMode,
    /// Readings per burst
    pub burst_size: usize,
    /// Bursts per averaged decision
    pub bursts: usize,
}

impl Default for DetectionCfg {
    fn default() -> Self {
        Self {
            mode: DetectionMode::Averaged,
            burst_size: 10,
            bursts: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    /// Pause between polls
    pub poll_interval_ms: u64,
    /// Play phrases on a worker thread instead of blocking the poll loop
    pub detach_playback: bool,
    /// Optional JSON-lines file receiving sitting/speaking events
    pub events_file: Option<PathBuf>,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            detach_playback: false,
            events_file: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PhrasesCfg {
    pub path: PathBuf,
    /// Key of the set to draw from (e.g. "tame" or "vulgar")
    pub set: String,
}

impl Default for PhrasesCfg {
    fn default() -> Self {
        Self {
            path: PathBuf::from("etc/phrases.json"),
            set: "tame".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AudioCfg {
    /// Directory holding cached clips (and optionally ids.json)
    pub clip_dir: PathBuf,
}

impl Default for AudioCfg {
    fn default() -> Self {
        Self {
            clip_dir: PathBuf::from("audio"),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub serial: Serial,
    #[serde(default)]
    pub calibration: CalibrationCfg,
    #[serde(default)]
    pub detection: DetectionCfg,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub phrases: PhrasesCfg,
    #[serde(default)]
    pub audio: AudioCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Serial
        if self.serial.device.trim().is_empty() {
            eyre::bail!("serial.device must not be empty");
        }
        if self.serial.baud == 0 {
            eyre::bail!("serial.baud must be > 0");
        }
        if self.serial.read_timeout_ms == 0 {
            eyre::bail!("serial.read_timeout_ms must be >= 1");
        }

        // Calibration
        if self.calibration.margin_multiplier == 0 {
            eyre::bail!("calibration.margin_multiplier must be >= 1");
        }
        if self.calibration.samples == 0 {
            eyre::bail!("calibration.samples must be >= 1");
        }

        // Detection
        if self.detection.burst_size == 0 {
            eyre::bail!("detection.burst_size must be >= 1");
        }
        if self.detection.bursts == 0 {
            eyre::bail!("detection.bursts must be >= 1");
        }

        // Runner
        if self.runner.poll_interval_ms > 60 * 1000 {
            eyre::bail!("runner.poll_interval_ms is unreasonably large (>60s)");
        }

        // Phrases
        if self.phrases.set.trim().is_empty() {
            eyre::bail!("phrases.set must not be empty");
        }

        // Logging
        if let Some(rotation) = self.logging.rotation.as_deref()
            && !matches!(rotation, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rotation:?}");
        }

        Ok(())
    }
}

/// Phrases keyed by set name, e.g. `{"tame": [...], "vulgar": [...]}`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PhraseSet(BTreeMap<String, Vec<String>>);

impl PhraseSet {
    pub fn from_json(s: &str) -> eyre::Result<Self> {
        let set: Self = serde_json::from_str(s).map_err(|e| eyre::eyre!("parse phrases: {e}"))?;
        if set.0.is_empty() {
            eyre::bail!("no phrases loaded");
        }
        Ok(set)
    }

    /// The phrases of set `key`. A missing or empty set is an error: the
    /// watcher would have nothing to say.
    pub fn phrases(&self, key: &str) -> eyre::Result<&[String]> {
        match self.0.get(key) {
            Some(list) if !list.is_empty() => Ok(list.as_slice()),
            Some(_) => eyre::bail!("phrase set {key:?} is empty"),
            None => eyre::bail!(
                "could not find phrase set {key:?}; available: {}",
                self.keys().collect::<Vec<_>>().join(", ")
            ),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<BTreeMap<String, Vec<String>>> for PhraseSet {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

pub fn load_phrases_json(path: &Path) -> eyre::Result<PhraseSet> {
    if !path.is_file() {
        eyre::bail!("could not find phrases json: {}", path.display());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read phrases {}: {e}", path.display()))?;
    PhraseSet::from_json(&text).map_err(|e| eyre::eyre!("{}: {e}", path.display()))
}
