use perch_config::{load_phrases_json, load_toml};
use rstest::rstest;
use std::fs;

const VALID: &str = r#"
[serial]
device = "/dev/ttyAMA1"
baud = 9600
read_timeout_ms = 500

[calibration]
margin_multiplier = 3
samples = 50

[detection]
mode = "single"
burst_size = 10
bursts = 10

[runner]
poll_interval_ms = 10
detach_playback = true

[phrases]
path = "etc/phrases.json"
set = "vulgar"

[logging]
rotation = "daily"
"#;

#[test]
fn accepts_full_config() {
    let cfg = load_toml(VALID).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.calibration.margin_multiplier, 3);
    assert!(cfg.runner.detach_playback);
    assert_eq!(cfg.phrases.set, "vulgar");
}

#[rstest]
#[case("baud = 9600", "baud = 0", "serial.baud must be > 0")]
#[case("read_timeout_ms = 500", "read_timeout_ms = 0", "serial.read_timeout_ms must be >= 1")]
#[case("margin_multiplier = 3", "margin_multiplier = 0", "calibration.margin_multiplier must be >= 1")]
#[case("samples = 50", "samples = 0", "calibration.samples must be >= 1")]
#[case("burst_size = 10", "burst_size = 0", "detection.burst_size must be >= 1")]
#[case("bursts = 10", "bursts = 0", "detection.bursts must be >= 1")]
#[case("poll_interval_ms = 10", "poll_interval_ms = 120000", "runner.poll_interval_ms")]
#[case("set = \"vulgar\"", "set = \"  \"", "phrases.set must not be empty")]
#[case("device = \"/dev/ttyAMA1\"", "device = \"\"", "serial.device must not be empty")]
#[case("rotation = \"daily\"", "rotation = \"weekly\"", "logging.rotation")]
fn rejects_out_of_range_values(#[case] from: &str, #[case] to: &str, #[case] needle: &str) {
    let toml = VALID.replacen(from, to, 1);
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[test]
fn loads_phrases_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("phrases.json");
    fs::write(&path, r#"{"tame": ["Comfy?"], "vulgar": ["Oof."]}"#).unwrap();

    let set = load_phrases_json(&path).expect("load");
    assert_eq!(set.phrases("vulgar").unwrap(), ["Oof."]);
    assert_eq!(set.keys().collect::<Vec<_>>(), ["tame", "vulgar"]);
}

#[test]
fn missing_phrase_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_phrases_json(&dir.path().join("nope.json")).unwrap_err();
    assert!(format!("{err}").contains("could not find phrases json"));
}

#[test]
fn malformed_phrase_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("phrases.json");
    fs::write(&path, "{\"tame\": [1, 2]}").unwrap();
    let err = load_phrases_json(&path).unwrap_err();
    assert!(format!("{err}").contains("parse phrases"));
}
