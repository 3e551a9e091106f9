use std::fs::File;
use std::io::BufReader;

use perch_traits::Speaker;
use rodio::{Decoder, OutputStream, Sink};

use crate::error::HwError;
use crate::speaker::ClipLibrary;

/// Plays cached clips on the default output device, blocking until the
/// clip ends.
pub struct RodioSpeaker {
    library: ClipLibrary,
}

impl RodioSpeaker {
    pub fn new(library: ClipLibrary) -> Self {
        Self { library }
    }
}

impl Speaker for RodioSpeaker {
    fn speak(&mut self, text: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let path = self.library.resolve(text).ok_or_else(|| HwError::MissingClip {
            text: text.to_string(),
            path: self.library.clip_path(text),
        })?;

        // The stream handle must outlive the sink.
        let (_stream, handle) =
            OutputStream::try_default().map_err(|e| HwError::Audio(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| HwError::Audio(e.to_string()))?;
        let file = File::open(&path).map_err(HwError::from)?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| HwError::Audio(e.to_string()))?;

        sink.append(source);
        sink.sleep_until_end();
        tracing::debug!(path = %path.display(), "clip finished");
        Ok(())
    }
}
