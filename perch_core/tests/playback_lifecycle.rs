//! Detached playback: at most one pending phrase, worker joined on drop.

use crossbeam_channel as xch;
use perch_core::{DetachedSpeaker, PerchError};
use perch_traits::Speaker;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Blocks inside `speak` until the test releases it.
struct GatedSpeaker {
    started: xch::Sender<String>,
    release: xch::Receiver<()>,
    played: Arc<Mutex<Vec<String>>>,
}

impl Speaker for GatedSpeaker {
    fn speak(&mut self, text: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let _ = self.started.send(text.to_string());
        let _ = self.release.recv();
        self.played.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[test]
fn phrase_is_dropped_while_one_is_pending() {
    let (started_tx, started_rx) = xch::unbounded();
    let (release_tx, release_rx) = xch::unbounded();
    let played = Arc::new(Mutex::new(Vec::new()));
    let mut speaker = DetachedSpeaker::spawn(GatedSpeaker {
        started: started_tx,
        release: release_rx,
        played: Arc::clone(&played),
    })
    .unwrap();

    speaker.speak("a").unwrap();
    // Wait until the worker holds "a", so the channel slot is free again.
    assert_eq!(
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        "a"
    );
    speaker.speak("b").unwrap();

    let err = speaker.speak("c").unwrap_err();
    assert_eq!(
        err.downcast_ref::<PerchError>(),
        Some(&PerchError::PlaybackBusy)
    );

    release_tx.send(()).unwrap();
    release_tx.send(()).unwrap();
    drop(speaker);
    assert_eq!(*played.lock().unwrap(), vec!["a", "b"]);
}

#[test]
fn many_speakers_do_not_leak_threads() {
    for _ in 0..10 {
        let rec = perch_core::mocks::RecordingSpeaker::new();
        let mut s = DetachedSpeaker::spawn(rec).unwrap();
        let _ = s.speak("hi");
        drop(s);
    }
}
