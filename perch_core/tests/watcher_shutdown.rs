use perch_core::mocks::{ManualClock, RecordingSink, RecordingSpeaker, ScriptedSensor};
use perch_core::{Calibration, DetectionMode, DetectionParams, RunSummary, Threshold, Watcher};
use rstest::rstest;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Never runs dry.
struct EmptySeat;

impl perch_traits::Sensor for EmptySeat {
    fn request_and_read(&mut self) -> Option<u32> {
        Some(100)
    }
}

fn watcher(clock: ManualClock) -> Watcher {
    Watcher::builder()
        .with_sensor(ScriptedSensor::repeat(100, 1000))
        .with_speaker(RecordingSpeaker::new())
        .with_calibration(Calibration::fixed(Threshold::new(1000).unwrap()))
        .with_detection(DetectionParams {
            mode: DetectionMode::Single,
            burst_size: 2,
            bursts: 1,
        })
        .with_poll_interval(Duration::from_millis(7))
        .with_phrases(["x"])
        .with_clock(clock)
        .with_sink(RecordingSink::new())
        .build()
        .unwrap()
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(20)]
fn stops_at_max_polls(#[case] max: u64) {
    let clock = ManualClock::new();
    let mut w = watcher(clock.clone());
    let summary = w.run(&AtomicBool::new(false), Some(max));
    assert_eq!(
        summary,
        RunSummary {
            polls: max,
            triggers: 0,
            speak_failures: 0
        }
    );
    assert_eq!(clock.elapsed(), Duration::from_millis(7 * max));
}

#[test]
fn preset_shutdown_flag_polls_nothing() {
    let mut w = watcher(ManualClock::new());
    let summary = w.run(&AtomicBool::new(true), None);
    assert_eq!(summary.polls, 0);
}

#[test]
fn shutdown_from_another_thread_stops_the_loop() {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    let flag = Arc::new(AtomicBool::new(false));
    let setter = Arc::clone(&flag);
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        setter.store(true, Ordering::Relaxed);
    });

    // Real clock, endless sensor: only the flag can end this run.
    let mut w = Watcher::builder()
        .with_sensor(EmptySeat)
        .with_speaker(RecordingSpeaker::new())
        .with_calibration(Calibration::fixed(Threshold::new(1000).unwrap()))
        .with_poll_interval(Duration::from_millis(1))
        .with_phrases(["x"])
        .with_sink(RecordingSink::new())
        .build()
        .unwrap();
    let summary = w.run(&flag, None);
    handle.join().unwrap();
    assert!(summary.polls > 0);
    assert_eq!(summary.triggers, 0);
}
