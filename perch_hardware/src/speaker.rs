//! Speakers: a log-only speaker for rigs without audio, and the clip
//! library that maps a phrase to its pre-rendered audio file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use perch_traits::Speaker;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Cache key for a phrase: hex SHA-256 of its lower-cased text.
pub fn clip_key(text: &str) -> String {
    let lower = text.to_lowercase();
    format!("{:x}", Sha256::digest(lower.as_bytes()))
}

/// Prints the phrase instead of playing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn speak(&mut self, text: &str) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(phrase = text, "speaking (log only)");
        println!("Told them: {text}");
        Ok(())
    }
}

/// Directory of cached clips, one file per phrase.
///
/// A clip lives at `<dir>/<clip_key>.mp3` unless `<dir>/ids.json` maps the
/// key to another file name. Producing clips is someone else's job; this
/// type only resolves them.
#[derive(Debug, Clone)]
pub struct ClipLibrary {
    dir: PathBuf,
    index: HashMap<String, String>,
}

impl ClipLibrary {
    pub const INDEX_FILE: &'static str = "ids.json";
    pub const EXTENSION: &'static str = "mp3";

    /// Open a clip directory. A missing directory or index is an empty
    /// library; an unreadable index is ignored with a warning.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let index_path = dir.join(Self::INDEX_FILE);
        let index = if index_path.is_file() {
            let text = std::fs::read_to_string(&index_path)?;
            match serde_json::from_str::<HashMap<String, String>>(&text) {
                Ok(index) => index,
                Err(e) => {
                    tracing::warn!(
                        path = %index_path.display(),
                        error = %e,
                        "could not parse clip index; falling back to hashed names"
                    );
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };
        tracing::debug!(dir = %dir.display(), indexed = index.len(), "clip library opened");
        Ok(Self { dir, index })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the clip for `text` is expected, whether or not it exists.
    pub fn clip_path(&self, text: &str) -> PathBuf {
        let key = clip_key(text);
        match self.index.get(&key) {
            Some(file) => self.dir.join(file),
            None => self.dir.join(format!("{key}.{}", Self::EXTENSION)),
        }
    }

    /// The clip for `text`, if it is present on disk.
    pub fn resolve(&self, text: &str) -> Option<PathBuf> {
        let path = self.clip_path(text);
        path.is_file().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn key_ignores_case() {
        assert_eq!(clip_key("Hello World!"), clip_key("hello world!"));
        assert_eq!(clip_key("hello").len(), 64);
    }

    #[test]
    fn key_is_sha256_of_lowercase_text() {
        // sha256("abc")
        assert_eq!(
            clip_key("ABC"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn resolves_hashed_clip_names() {
        let dir = tempfile::tempdir().unwrap();
        let lib = ClipLibrary::open(dir.path()).unwrap();
        assert!(lib.resolve("Get off me").is_none());

        let expected = dir.path().join(format!("{}.mp3", clip_key("get off me")));
        fs::write(&expected, b"ID3").unwrap();
        assert_eq!(lib.resolve("Get off me"), Some(expected));
    }

    #[test]
    fn index_remaps_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let key = clip_key("hi");
        fs::write(
            dir.path().join(ClipLibrary::INDEX_FILE),
            format!(r#"{{"{key}": "greeting.mp3"}}"#),
        )
        .unwrap();
        fs::write(dir.path().join("greeting.mp3"), b"ID3").unwrap();

        let lib = ClipLibrary::open(dir.path()).unwrap();
        assert_eq!(lib.resolve("HI"), Some(dir.path().join("greeting.mp3")));
    }

    #[test]
    fn malformed_index_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ClipLibrary::INDEX_FILE), "{not json").unwrap();
        let lib = ClipLibrary::open(dir.path()).unwrap();
        assert_eq!(
            lib.clip_path("x"),
            dir.path().join(format!("{}.mp3", clip_key("x")))
        );
    }

    #[test]
    fn log_speaker_never_fails() {
        assert!(LogSpeaker.speak("hello").is_ok());
    }
}
