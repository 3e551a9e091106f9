//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "perch",
    version,
    about = "Says something when someone sits on the seat"
)]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/perch.toml")]
    pub config: PathBuf,

    /// Serial device of the remote sampler (overrides serial.device)
    #[arg(long, value_name = "PATH")]
    pub device: Option<String>,

    /// Log as JSON lines instead of pretty, and report errors as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); falls back to
    /// logging.level, then info
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Which phrases to draw from.
#[derive(Args, Debug, Clone, Default)]
pub struct PhraseChoice {
    /// Use the "vulgar" phrase set
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "phrase_set")]
    pub vulgar: bool,

    /// Use the named phrase set (overrides phrases.set)
    #[arg(long, value_name = "KEY")]
    pub phrase_set: Option<String>,
}

impl PhraseChoice {
    pub fn key<'a>(&'a self, configured: &'a str) -> &'a str {
        if self.vulgar {
            "vulgar"
        } else {
            self.phrase_set.as_deref().unwrap_or(configured)
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Calibrate, then watch the seat and speak once per sitting
    Run {
        #[command(flatten)]
        phrases: PhraseChoice,
        /// Skip calibration and use this presence threshold (0..=32768)
        #[arg(long, value_name = "N")]
        threshold: Option<u64>,
        /// Stop after this many polls (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        max_polls: Option<u64>,
    },
    /// Calibrate on the empty seat and print baseline and threshold
    Calibrate,
    /// Take one reading and print it
    SelfCheck,
    /// List the phrases of a set with their clip keys and cache status
    Clips {
        #[command(flatten)]
        phrases: PhraseChoice,
    },
}
