use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tracing::{info, warn};

use crate::app::adb::locator::{executable_dir, locate_adb};
use crate::app::adb::runner::{HostRunner, StreamTarget};
use crate::app::collector::{default_workspace_dir, BugreportCollector, Console};
use crate::app::config::{load_config, load_config_from_path, CollectorConfig};
use crate::app::error::AppError;
use crate::app::interrupt::InterruptGate;
use crate::app::logging::init_logging;
use crate::app::models::{CollectOptions, CollectReport};

/// Collect a bugreport from a connected Android device.
#[derive(Debug, Clone, Parser)]
#[command(name = "collect-bugreport", version)]
pub struct Cli {
    /// Take a screenshot of the device
    #[arg(long)]
    pub screenshot: bool,

    /// Record the device screen until Ctrl+C
    #[arg(long)]
    pub screenrecord: bool,

    /// Serial of the device to use instead of the first ready one
    #[arg(long, env = "ANDROID_SERIAL")]
    pub serial: Option<String>,

    /// adb executable to use instead of the bundled bin/<platform>/adb
    #[arg(long)]
    pub adb: Option<String>,

    /// Config file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory the bugreport archive is written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Print a JSON summary of the run on stdout
    #[arg(long)]
    pub json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}

pub fn resolve_options(cli: &Cli, config: &CollectorConfig, base_dir: &std::path::Path) -> CollectOptions {
    let output_dir = cli
        .output_dir
        .clone()
        .or_else(|| non_empty(&config.output_dir).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let workspace_dir = non_empty(&config.workspace_dir)
        .map(PathBuf::from)
        .unwrap_or_else(|| default_workspace_dir(base_dir));
    CollectOptions {
        screenshot: cli.screenshot,
        screenrecord: cli.screenrecord,
        serial: cli.serial.clone(),
        output_dir,
        workspace_dir,
    }
}

pub fn run(cli: &Cli, trace_id: &str) -> Result<CollectReport, AppError> {
    let config = match &cli.config {
        Some(path) => load_config_from_path(path, trace_id),
        None => load_config(trace_id),
    };
    init_logging(
        cli.verbose,
        config.as_ref().map(|config| config.logging.json).unwrap_or(false),
    );
    let config = config?;

    let base_dir = executable_dir();
    let adb_override = cli.adb.as_deref().unwrap_or(&config.adb_path);
    let adb_program = locate_adb(adb_override, &base_dir, std::env::consts::OS, trace_id)?;
    info!(trace_id = %trace_id, adb = %adb_program, "Using adb");

    let gate = InterruptGate::new();
    if let Err(err) = gate.install(trace_id) {
        warn!(trace_id = %trace_id, error = %err, "Ctrl+C will end the program instead of the recording");
    }

    let options = resolve_options(cli, &config, &base_dir);
    // With --json, stdout carries the summary and nothing else.
    let (console, stream_target) = if cli.json {
        (Console::Stderr, StreamTarget::Stderr)
    } else {
        (Console::Stdout, StreamTarget::Stdout)
    };
    let runner = HostRunner::new(
        trace_id,
        Duration::from_secs(config.screen_record.stop_grace_secs),
    )
    .with_stream_target(stream_target);

    BugreportCollector::new(&runner, &adb_program, &config, &gate, console, trace_id).collect(&options)
}
