//! Detached phrase playback.
//!
//! Spawns one worker thread that owns the real speaker and plays phrases
//! handed over a bounded channel of capacity one. Requests that arrive while
//! a phrase is still queued are dropped rather than backing up the watcher.
//!
//! The worker exits when the `DetachedSpeaker` is dropped: the sender goes
//! away, the channel disconnects, and `Drop` joins the thread.
use crossbeam_channel as xch;
use perch_traits::Speaker;
use std::thread::JoinHandle;

use crate::error::PerchError;

type SpeakResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub struct DetachedSpeaker {
    tx: Option<xch::Sender<String>>,
    join_handle: Option<JoinHandle<()>>,
}

impl DetachedSpeaker {
    pub fn spawn<P: Speaker + Send + 'static>(mut inner: P) -> Result<Self, PerchError> {
        let (tx, rx) = xch::bounded::<String>(1);
        let join_handle = std::thread::Builder::new()
            .name("perch-playback".into())
            .spawn(move || {
                for phrase in rx.iter() {
                    if let Err(e) = inner.speak(&phrase) {
                        tracing::warn!(error = %e, %phrase, "detached playback failed");
                    }
                }
                tracing::trace!("playback thread exiting cleanly");
            })
            .map_err(|e| PerchError::Playback(format!("spawn playback thread: {e}")))?;

        Ok(Self {
            tx: Some(tx),
            join_handle: Some(join_handle),
        })
    }
}

impl Speaker for DetachedSpeaker {
    /// Queue `text` without waiting for it to play. Fails with
    /// [`PerchError::PlaybackBusy`] if a phrase is already waiting.
    fn speak(&mut self, text: &str) -> SpeakResult {
        let Some(tx) = self.tx.as_ref() else {
            return Err(Box::new(PerchError::Playback("playback stopped".into())));
        };
        match tx.try_send(text.to_string()) {
            Ok(()) => Ok(()),
            Err(xch::TrySendError::Full(_)) => {
                tracing::warn!(phrase = %text, "playback busy; dropping phrase");
                Err(Box::new(PerchError::PlaybackBusy))
            }
            Err(xch::TrySendError::Disconnected(_)) => Err(Box::new(PerchError::Playback(
                "playback thread is gone".into(),
            ))),
        }
    }
}

impl Drop for DetachedSpeaker {
    fn drop(&mut self) {
        // Disconnect first so the worker's receive loop ends.
        drop(self.tx.take());
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("playback thread joined"),
                Err(e) => tracing::warn!(?e, "playback thread panicked during shutdown"),
            }
        }
    }
}
