//! Command implementations: hardware assembly, calibration, and the watch loop.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use eyre::WrapErr;
use perch_config::{Config, PhraseSet};
use perch_core::{
    Calibration, CalibrationParams, DetachedSpeaker, DetectionParams, EventSink, JsonlSink,
    RunSummary, Threshold, TracingSink, Watcher,
};
use perch_hardware::{ClipLibrary, Speaker, clip_key};
use perch_traits::Sensor;

use crate::cli::PhraseChoice;

/// Empty-seat value served by the simulator when no script is given.
#[cfg(not(feature = "hardware"))]
const SIM_EMPTY_SEAT: perch_traits::Reading = 250;

/// Context marking a report as a setup problem (config, phrases, clip
/// directory). Exit code 2.
#[derive(Debug, Clone, Copy)]
pub struct SetupError(pub &'static str);

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}", self.0)
    }
}

pub fn load_config(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))
        .wrap_err(SetupError("configuration"))?;
    let cfg = perch_config::load_toml(&text)
        .map_err(|e: toml::de::Error| eyre::eyre!("parse config {}: {e}", path.display()))
        .wrap_err(SetupError("configuration"))?;
    cfg.validate().wrap_err(SetupError("configuration"))?;
    Ok(cfg)
}

/// The configured phrase set, narrowed to the chosen key.
pub fn load_phrases(cfg: &Config, choice: &PhraseChoice) -> eyre::Result<(String, Vec<String>)> {
    let key = choice.key(&cfg.phrases.set).to_string();
    let set: PhraseSet =
        perch_config::load_phrases_json(&cfg.phrases.path).wrap_err(SetupError("phrases"))?;
    let phrases = set.phrases(&key).wrap_err(SetupError("phrases"))?.to_vec();
    tracing::debug!(set = %key, count = phrases.len(), "phrases loaded");
    Ok((key, phrases))
}

/// Open the serial channel (feature `hardware`) or the simulated sensor.
pub fn open_sensor(cfg: &Config, device: Option<&str>) -> eyre::Result<Box<dyn Sensor>> {
    let device = device.unwrap_or(&cfg.serial.device);

    #[cfg(feature = "hardware")]
    {
        let timeout = std::time::Duration::from_millis(cfg.serial.read_timeout_ms);
        let sensor = perch_hardware::SerialSensor::open(device, cfg.serial.baud, timeout)?;
        tracing::info!(device, baud = cfg.serial.baud, "serial sensor opened");
        Ok(Box::new(sensor))
    }

    #[cfg(not(feature = "hardware"))]
    {
        let sensor = match std::env::var("PERCH_SIM_SCRIPT") {
            Ok(script) => perch_hardware::SimulatedSensor::from_script(&script)
                .wrap_err(SetupError("PERCH_SIM_SCRIPT"))?,
            Err(_) => perch_hardware::SimulatedSensor::constant(SIM_EMPTY_SEAT),
        };
        tracing::info!(device, "built without serial support; using simulated sensor");
        Ok(Box::new(sensor))
    }
}

fn make_speaker(cfg: &Config) -> eyre::Result<Box<dyn Speaker + Send>> {
    #[cfg(feature = "audio")]
    let inner: Box<dyn Speaker + Send> = {
        let library = ClipLibrary::open(&cfg.audio.clip_dir).wrap_err(SetupError("clip directory"))?;
        Box::new(perch_hardware::RodioSpeaker::new(library))
    };
    #[cfg(not(feature = "audio"))]
    let inner: Box<dyn Speaker + Send> = Box::new(perch_hardware::LogSpeaker);

    if cfg.runner.detach_playback {
        tracing::debug!("playback detached from the poll loop");
        Ok(Box::new(DetachedSpeaker::spawn(inner)?))
    } else {
        Ok(inner)
    }
}

fn make_sink(cfg: &Config) -> Vec<Box<dyn EventSink>> {
    let mut sinks: Vec<Box<dyn EventSink>> = vec![Box::new(TracingSink)];
    if let Some(path) = &cfg.runner.events_file {
        sinks.push(Box::new(JsonlSink::new(path)));
    }
    sinks
}

pub fn calibrate(cfg: &Config, sensor: &mut dyn Sensor) -> eyre::Result<Calibration> {
    let params = CalibrationParams::from(&cfg.calibration);
    tracing::info!(
        samples = params.samples,
        margin_multiplier = params.margin_multiplier,
        "calibrating; keep the seat empty"
    );
    Ok(params.run(sensor)?)
}

pub fn print_calibration(cal: &Calibration, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({ "baseline": cal.baseline, "threshold": cal.threshold.get() })
        );
    } else {
        println!("baseline: {}", cal.baseline);
        println!("threshold: {}", cal.threshold);
    }
}

pub struct RunOpts<'a> {
    pub phrases: &'a PhraseChoice,
    pub threshold: Option<u64>,
    pub max_polls: Option<u64>,
    pub json: bool,
}

pub fn run_watch(
    cfg: &Config,
    mut sensor: Box<dyn Sensor>,
    opts: &RunOpts<'_>,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<RunSummary> {
    // Fail on a bad phrase set before spending time calibrating.
    let (set, phrases) = load_phrases(cfg, opts.phrases)?;

    let calibration = match opts.threshold {
        Some(n) => {
            let threshold = Threshold::new(n).wrap_err(SetupError("--threshold"))?;
            tracing::info!(threshold = threshold.get(), "using fixed threshold");
            Calibration::fixed(threshold)
        }
        None => {
            let cal = calibrate(cfg, sensor.as_mut())?;
            print_calibration(&cal, opts.json);
            cal
        }
    };

    let detection = DetectionParams::from(&cfg.detection);
    let mut watcher = Watcher::builder()
        .with_sensor(sensor)
        .with_speaker(make_speaker(cfg)?)
        .with_calibration(calibration)
        .with_detection(detection)
        .with_poll_interval(perch_core::conversions::poll_interval(&cfg.runner))
        .with_phrases(phrases)
        .with_sink(make_sink(cfg))
        .build()?;

    tracing::info!(
        set = %set,
        mode = ?detection.mode,
        readings_per_poll = detection.readings_per_decision(),
        "watching the seat"
    );
    let summary = watcher.run(shutdown, opts.max_polls);
    tracing::info!(
        polls = summary.polls,
        triggers = summary.triggers,
        speak_failures = summary.speak_failures,
        "watch finished"
    );
    Ok(summary)
}

pub fn self_check(sensor: &mut dyn Sensor, json: bool) -> eyre::Result<()> {
    let Some(reading) = sensor.request_and_read() else {
        eyre::bail!("no reading from the sensor");
    };
    if json {
        println!("{}", serde_json::json!({ "reading": reading }));
    } else {
        println!("reading: {reading}");
    }
    Ok(())
}

/// Print each phrase with its clip key and whether the clip is cached.
pub fn list_clips(cfg: &Config, choice: &PhraseChoice, json: bool) -> eyre::Result<()> {
    let (set, phrases) = load_phrases(cfg, choice)?;
    let library = ClipLibrary::open(&cfg.audio.clip_dir).wrap_err(SetupError("clip directory"))?;
    let mut missing = 0usize;
    for phrase in &phrases {
        let cached = library.resolve(phrase).is_some();
        if !cached {
            missing += 1;
        }
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "set": set,
                    "phrase": phrase,
                    "key": clip_key(phrase),
                    "cached": cached,
                })
            );
        } else {
            let mark = if cached { "cached " } else { "missing" };
            println!("{mark} {} {phrase}", clip_key(phrase));
        }
    }
    tracing::info!(
        set = %set,
        total = phrases.len(),
        missing,
        dir = %library.dir().display(),
        "clip check done"
    );
    Ok(())
}
