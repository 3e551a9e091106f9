use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("open serial device {device}: {reason}")]
    Open { device: String, reason: String },
    #[error("sensor reply timeout")]
    Timeout,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("no cached clip for {text:?} (expected {})", path.display())]
    MissingClip { text: String, path: PathBuf },
    #[error("audio: {0}")]
    Audio(String),
    #[error("invalid sensor script: {0}")]
    Script(String),
}

pub type Result<T> = std::result::Result<T, HwError>;
