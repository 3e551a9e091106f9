//! Human-readable error descriptions, exit codes, and structured JSON errors.

use perch_core::error::{BuildError, CalibrationError, PerchError};
use perch_hardware::HwError;

use crate::watch::SetupError;

fn calibration_error(err: &eyre::Report) -> Option<&CalibrationError> {
    err.downcast_ref::<CalibrationError>().or_else(|| match err.downcast_ref::<PerchError>() {
        Some(PerchError::Calibration(c)) => Some(c),
        _ => None,
    })
}

fn is_open_failure(err: &eyre::Report) -> bool {
    matches!(err.downcast_ref::<HwError>(), Some(HwError::Open { .. }))
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(setup) = err.downcast_ref::<SetupError>() {
        let cause = err
            .chain()
            .skip(1)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ");
        return format!(
            "What happened: {setup} ({cause}).\nLikely causes: A missing file, a typo in the TOML/JSON, or an out-of-range value.\nHow to fix: Fix the reported key or file and rerun. See etc/perch.toml for a sample."
        );
    }

    if let Some(ce) = calibration_error(err) {
        return match ce {
            CalibrationError::BadReading { index, reading: None } => format!(
                "What happened: Calibration lost a reply from the sensor (sample {index}).\nLikely causes: Loose serial wiring, wrong baud rate, or the sampler is not powered.\nHow to fix: Check the UART connection and serial.baud, then rerun calibration."
            ),
            CalibrationError::BadReading {
                index,
                reading: Some(v),
            } => format!(
                "What happened: Calibration got an impossible reading {v} (sample {index}).\nLikely causes: Line noise or a sampler sending out-of-range values.\nHow to fix: Check the wiring and grounding, then rerun calibration."
            ),
            CalibrationError::NoSamples => "What happened: Calibration collected no samples.\nLikely causes: calibration.samples is 0.\nHow to fix: Set calibration.samples to at least 1.".to_string(),
            CalibrationError::ThresholdOutOfRange(v) => format!(
                "What happened: Threshold {v} is outside the usable range.\nLikely causes: A corrupt calibration.\nHow to fix: Rerun calibration with the seat empty."
            ),
        };
    }

    if let Some(hw) = err.downcast_ref::<HwError>() {
        return match hw {
            HwError::Open { device, reason } => format!(
                "What happened: Could not open serial device {device} ({reason}).\nLikely causes: Wrong device path, missing permissions (dialout group), or the device is in use.\nHow to fix: Check serial.device or pass --device, and make sure no other program holds the port."
            ),
            HwError::Timeout => "What happened: The sensor did not reply in time.\nLikely causes: Sampler not powered or wrong baud rate.\nHow to fix: Check power and serial.baud; consider raising serial.read_timeout_ms.".to_string(),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug for more detail."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingCalibration => "What happened: The watcher was started without a calibration.\nLikely causes: Calibration was skipped.\nHow to fix: Run without --threshold to calibrate, or pass a valid --threshold.".to_string(),
            BuildError::NoPhrases => "What happened: There is nothing to say.\nLikely causes: The chosen phrase set is empty.\nHow to fix: Add phrases to the set or pick another with --phrase-set.".to_string(),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(pe) = err.downcast_ref::<PerchError>() {
        return format!(
            "What happened: {pe}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: calibration 3, sensor open 4, setup 2, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<SetupError>().is_some() || err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    if calibration_error(err).is_some() {
        return 3;
    }
    if is_open_failure(err) {
        return 4;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match exit_code_for_error(err) {
        2 => "Setup",
        3 => "CalibrationFailed",
        4 => "SensorUnavailable",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    });
    if let Some(CalibrationError::BadReading { index, reading }) = calibration_error(err) {
        obj["details"] = json!({ "index": index, "reading": reading });
    }
    obj.to_string()
}
