//! Bootcheck CLI - Command line interface
//!
//! Project-based execution - configuration from bootcheck.json, overridden by flags

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

mod platform;

use crate::platform::{print_json, print_summary, ConsoleOutput};
use bootcheck_api::{run, HarnessConfig, LogLevel, OutputBuffer, RunConfig, StageId, StageSelection};

#[derive(Parser)]
#[command(
    name = "bootcheck",
    about = "Bootstrap a self-hosting compiler stage by stage and verify the fixpoint",
    version = "0.1.0"
)]
struct Cli {
    /// Configuration file path (default: ./bootcheck.json)
    #[arg(value_name = "CONFIG", default_value = "bootcheck.json")]
    config: PathBuf,

    /// Load stage0 from the snapshot artifact instead of the host toolchain
    #[arg(long)]
    snapshot: bool,

    /// Enabled stages, e.g. 0,1,2,3 (replaces the configured set)
    #[arg(long, value_delimiter = ',', value_parser = parse_stage)]
    stages: Option<Vec<StageId>>,

    /// Only run tests whose name contains this text
    #[arg(long)]
    filter: Option<String>,

    /// Log level: "silent", "error", "warn", "info", "debug", "trace"
    #[arg(long, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,

    /// Also append log records to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    // Read bootcheck.json
    let harness = match read_config(&cli.config) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut run_config = build_run_config(harness, &cli);
    if let Some(path) = &cli.log_file {
        run_config = match run_config.with_log_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: cannot open log file '{}': {}", path.display(), e);
                process::exit(1);
            }
        };
    }

    let console = Arc::new(ConsoleOutput::new(cli.json));
    let result = run(&run_config, console.clone());
    let entries = console.drain();

    let passed = if cli.json {
        print_json(&entries, &result)
    } else {
        print_summary(&entries, &result)
    };

    if !passed {
        process::exit(1);
    }
}

/// Read and parse bootcheck.json, resolving paths against its directory
fn read_config(path: &Path) -> Result<HarnessConfig, String> {
    if !path.exists() {
        return Err(format!(
            "'{}' not found\n\nHint: create '{}' describing the compiler source, snapshot and test corpus",
            path.display(),
            path.display()
        ));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;

    let harness: HarnessConfig = serde_json::from_str(&content)
        .map_err(|e| format!("cannot parse '{}': {}", path.display(), e))?;

    Ok(harness.resolved(base_dir(path)))
}

/// Directory of the config file
fn base_dir(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Apply command line overrides
fn build_run_config(mut harness: HarnessConfig, cli: &Cli) -> RunConfig {
    if cli.snapshot {
        harness.stages.use_snapshot = true;
    }
    if let Some(stages) = &cli.stages {
        harness.stages = StageSelection::only(harness.stages.use_snapshot, stages);
    }
    if let Some(level) = cli.log_level {
        harness.log_level = level;
    }

    let config = RunConfig::from_harness(harness);
    match &cli.filter {
        Some(filter) => config.with_filter(filter.clone()),
        None => config,
    }
}

/// Parse a stage number ("2") or name ("stage2")
fn parse_stage(s: &str) -> Result<StageId, String> {
    let s = s.trim();
    let digits = s.strip_prefix("stage").unwrap_or(s);
    digits
        .parse::<usize>()
        .ok()
        .and_then(StageId::from_index)
        .ok_or_else(|| format!("unknown stage '{}', expected 0..3", s))
}

/// Parse log level string
fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    LogLevel::parse(s).ok_or_else(|| format!("unknown log level '{}'", s))
}
