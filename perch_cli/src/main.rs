#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `perch`: watch a seat and say something once per sitting.

mod cli;
mod error_fmt;
mod watch;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    // Config first so logging can honour [logging]; a bad config is still
    // reported through the error path below.
    let cfg = watch::load_config(&cli.config);
    let logging = cfg.as_ref().ok().map(|c| &c.logging);
    init_tracing(cli.json, cli.log_level.as_deref(), logging);

    let result = cfg.and_then(|cfg| dispatch(&cli, &cfg));
    if let Err(err) = result {
        let code = exit_code_for_error(&err);
        tracing::error!(error = %err, code, "perch failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(code);
    }
}

fn dispatch(cli: &Cli, cfg: &perch_config::Config) -> eyre::Result<()> {
    match &cli.cmd {
        Commands::Run {
            phrases,
            threshold,
            max_polls,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&shutdown);
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                tracing::warn!(error = %e, "could not install Ctrl-C handler");
            }
            let sensor = watch::open_sensor(cfg, cli.device.as_deref())?;
            let opts = watch::RunOpts {
                phrases,
                threshold: *threshold,
                max_polls: *max_polls,
                json: cli.json,
            };
            let summary = watch::run_watch(cfg, sensor, &opts, &shutdown)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "polls": summary.polls,
                        "triggers": summary.triggers,
                        "speak_failures": summary.speak_failures,
                    })
                );
            } else {
                println!(
                    "Watched {} polls: {} sittings, {} failed to play",
                    summary.polls, summary.triggers, summary.speak_failures
                );
            }
            Ok(())
        }
        Commands::Calibrate => {
            let mut sensor = watch::open_sensor(cfg, cli.device.as_deref())?;
            let cal = watch::calibrate(cfg, sensor.as_mut())?;
            watch::print_calibration(&cal, cli.json);
            Ok(())
        }
        Commands::SelfCheck => {
            let mut sensor = watch::open_sensor(cfg, cli.device.as_deref())?;
            watch::self_check(sensor.as_mut(), cli.json)
        }
        Commands::Clips { phrases } => watch::list_clips(cfg, phrases, cli.json),
    }
}

/// Install the global subscriber: console (pretty or JSON) on stderr, plus an
/// optional JSON file layer when `[logging].file` is set.
///
/// Level precedence: `RUST_LOG`, then `--log-level`, then `logging.level`,
/// then `info`.
fn init_tracing(json: bool, cli_level: Option<&str>, logging: Option<&perch_config::Logging>) {
    let level = cli_level
        .or_else(|| logging.and_then(|l| l.level.as_deref()))
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    let file = logging.and_then(|l| l.file.as_deref()).map(|path| {
        let path = std::path::Path::new(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "perch.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match logging.and_then(|l| l.rotation.as_deref()) {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init();
}
