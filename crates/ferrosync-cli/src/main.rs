//! ferrosync - incremental daily backups of one directory tree
//!
//! Copies new and changed files from a source tree onto a destination tree, either once
//! or every day at a fixed local time.

mod display;
mod json_output;
mod logging;
mod progress;
mod schedule;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use ferrosync_config::{Config, ConfigLoader};
use ferrosync_engine::{SyncEngine, SyncOptions, SyncRequest};
use ferrosync_types::DailyTime;
use json_output::{ErrorReportJson, EstimateReportJson, RunReportJson};
use logging::Verbosity;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

/// ferrosync - incremental backup of a directory tree
#[derive(Parser)]
#[command(
    name = "ferrosync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Incremental backup of a directory tree",
    long_about = "ferrosync copies new and changed files from a source directory onto a\n\
                  backup directory. Unchanged files are skipped, symbolic links are never\n\
                  followed, and one unreadable file never stops the rest of the backup."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Verbose mode - detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the log to this file instead of one file per day
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Directory for the daily log files (rolled over at UTC midnight)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print results as JSON on stdout
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backup now
    Run {
        /// Source directory
        source: PathBuf,
        /// Backup directory
        destination: PathBuf,
    },
    /// Run a backup every day at a fixed local time
    Schedule {
        /// Source directory
        source: PathBuf,
        /// Backup directory
        destination: PathBuf,
        /// Time of day, HH:MM (24-hour); defaults to the configured time
        #[arg(long)]
        time: Option<DailyTime>,
    },
    /// Show what a backup would copy without writing anything
    Estimate {
        /// Source directory
        source: PathBuf,
        /// Backup directory
        destination: PathBuf,
        /// List every file that would be copied
        #[arg(long)]
        list: bool,
    },
    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
        /// Write the configuration to this file instead of printing it
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            if json {
                let report = serde_json::json!({
                    "success": false,
                    "message": format!("{:#}", err),
                });
                println!("{}", report);
            } else {
                display::display_error(&format!("{:#}", err));
            }
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let mut config =
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Commands::Config { default, output } = &cli.command {
        config_command(&config, *default, output.as_deref())?;
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(log_file) = &cli.log_file {
        config.logging.log_file = Some(log_file.clone());
    }
    if let Some(log_dir) = &cli.log_dir {
        config.logging.log_dir = log_dir.clone();
    }

    let verbosity = Verbosity {
        debug: cli.debug,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };
    let _guard = logging::init_logging(&config.logging, verbosity, cli.json)?;

    info!("ferrosync v{} starting", env!("CARGO_PKG_VERSION"));

    let options = SyncOptions::from_config(&config.sync);
    let show_progress = !cli.quiet && !cli.json;

    match cli.command {
        Commands::Run {
            source,
            destination,
        } => {
            let request = SyncRequest::new(source, destination).with_options(options);
            Ok(run_command(&request, cli.json, show_progress))
        }
        Commands::Schedule {
            source,
            destination,
            time,
        } => {
            let at = match time {
                Some(at) => at,
                None => config.schedule.daily_time()?,
            };
            let request = SyncRequest::new(source, destination).with_options(options);
            schedule_command(&config, &request, at, cli.json, cli.quiet)
        }
        Commands::Estimate {
            source,
            destination,
            list,
        } => {
            let request = SyncRequest::new(source, destination).with_options(options);
            estimate_command(&request, list, cli.json)
        }
        Commands::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}

fn run_command(request: &SyncRequest, json: bool, show_progress: bool) -> ExitCode {
    info!(
        "Backing up {} to {}",
        request.source.display(),
        request.destination.display()
    );
    if show_progress {
        println!(
            "{} Backing up {} to {}",
            style("→").green().bold(),
            style(request.source.display()).cyan(),
            style(request.destination.display()).cyan()
        );
    }

    let mut engine = SyncEngine::new();
    if show_progress {
        engine = engine.with_progress(progress::BarProgress::new());
    }

    match engine.run(request) {
        Ok(summary) => {
            if json {
                print_json(&RunReportJson::new(
                    &request.source,
                    &request.destination,
                    summary,
                ));
            } else if show_progress {
                display::display_run_summary(&summary);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Backup aborted: {}", err);
            if json {
                print_json(&ErrorReportJson::new(
                    "run",
                    &request.source,
                    &request.destination,
                    err.to_string(),
                ));
            } else {
                display::display_error(&format!("Backup aborted: {}", err));
            }
            ExitCode::FAILURE
        }
    }
}

fn schedule_command(
    config: &Config,
    request: &SyncRequest,
    at: DailyTime,
    json: bool,
    quiet: bool,
) -> Result<ExitCode> {
    let scheduler = schedule::DailyScheduler::new(at, config.schedule.poll_interval());

    if !quiet && !json {
        display::display_info(&format!(
            "Backing up {} to {} every day at {}",
            request.source.display(),
            request.destination.display(),
            scheduler.at()
        ));
    }
    info!("Daily backup scheduled at {}", scheduler.at());

    scheduler.run_forever(|| {
        run_command(request, json, false);
    })
}

fn estimate_command(request: &SyncRequest, list: bool, json: bool) -> Result<ExitCode> {
    let estimate = SyncEngine::new().estimate(request, list || json)?;

    if json {
        print_json(&EstimateReportJson::new(
            &request.source,
            &request.destination,
            estimate,
        ));
    } else {
        display::display_estimate(&estimate);
    }

    Ok(ExitCode::SUCCESS)
}

fn config_command(config: &Config, default: bool, output: Option<&Path>) -> Result<()> {
    let config = if default {
        Config::default()
    } else {
        config.clone()
    };

    match output {
        Some(path) => {
            ConfigLoader::save_to_file(&config, path)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            display::display_success(&format!("Configuration written to {}", path.display()));
        }
        None => {
            if default {
                println!("{} Default configuration:", style("⚙").blue().bold());
            } else {
                println!("{} Current configuration:", style("⚙").blue().bold());
            }
            print!("{}", ConfigLoader::render(&config, Path::new("ferrosync.yaml"))?);
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(report: &T) {
    match serde_json::to_string_pretty(report) {
        Ok(text) => println!("{}", text),
        Err(err) => error!("Failed to serialize report: {}", err),
    }
}
