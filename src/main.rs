//! CLI entry point for the detector live-status daemon
//!
//! Provides command-line access to:
//! - The push daemon (`run`): streams dashboard status updates as JSON lines on
//!   stdout and accepts power command text on stdin
//! - One-shot storage target resolution (`resolve`)
//! - Power commands (`power`) and clock setting (`set-time`)
//! - The effective configuration (`show-config`)
//!
//! # Usage
//!
//! ```bash
//! detector-live run --config config/detector.toml
//! detector-live resolve bats --date-option date-pre-true
//! detector-live power rpi_status
//! detector-live set-time 1714590000
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use detector_live::config::AppConfig;
use detector_live::error::DetectorError;
use detector_live::notify::{ChangeAggregator, ClientLog, ClientLogger, NotificationSource};
use detector_live::power::{OsGate, PowerCommandRouter, ShellControl};
use detector_live::push::{JsonLineSink, PushSession};
use detector_live::sources::{LocationStore, RecorderState, SettingsStore};
use detector_live::storage::{DateOption, StorageTargetResolver};
use detector_live::tracing_setup;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "detector-live")]
#[command(about = "Live status layer of the bat detector", long_about = None)]
struct Cli {
    /// Configuration file (defaults to config/detector.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the push daemon until Ctrl+C
    Run,

    /// Print the directory a recording would be written to
    Resolve {
        /// Recording directory name
        directory: String,

        /// Date tag option (none, date-pre-true, date-post-after, ...)
        #[arg(long, default_value = "date-pre-true")]
        date_option: String,
    },

    /// Dispatch a power command (rpi_shutdown, rpi_reboot, rpi_status, ...)
    Power {
        command: String,
    },

    /// Set the detector clock from POSIX seconds
    SetTime {
        posix_seconds: i64,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    tracing_setup::init_from_config(&config).map_err(DetectorError::Tracing)?;

    match cli.command {
        Commands::Run => run_daemon(config).await,
        Commands::Resolve {
            directory,
            date_option,
        } => resolve_once(config, &directory, &date_option),
        Commands::Power { command } => {
            let (log, logger, mut pump) = ClientLog::channel(config.client_log.capacity);
            let router = build_router(&config, logger, Arc::new(RecorderState::default()));
            let outcome = router.dispatch_text(&command).await;
            pump.drain();
            print_rows(&log);
            tracing::debug!(?outcome, "Power command finished");
            Ok(())
        }
        Commands::SetTime { posix_seconds } => {
            let (log, logger, mut pump) = ClientLog::channel(config.client_log.capacity);
            let router = build_router(&config, logger, Arc::new(RecorderState::default()));
            let outcome = router.set_detector_time(posix_seconds, "by user").await;
            pump.drain();
            print_rows(&log);
            tracing::debug!(?outcome, "Time update finished");
            Ok(())
        }
        Commands::ShowConfig => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    config.validate().map_err(DetectorError::Configuration)?;
    Ok(config)
}

fn build_router(
    config: &AppConfig,
    logger: ClientLogger,
    recorder: Arc<RecorderState>,
) -> PowerCommandRouter {
    PowerCommandRouter::new(
        OsGate::from_config(&config.power),
        Arc::new(ShellControl::new(config.power.work_dir.clone())),
        recorder,
        logger,
    )
    .with_action_delay(config.power.action_delay())
}

/// Feed rows oldest-first, for one-shot commands.
fn print_rows(log: &ClientLog) {
    for row in log.rows().iter().rev() {
        eprintln!("{}", row);
    }
}

fn resolve_once(config: AppConfig, directory: &str, date_option: &str) -> Result<()> {
    let (log, logger, mut pump) = ClientLog::channel(config.client_log.capacity);
    let resolver = StorageTargetResolver::new(config.storage, logger);

    let result = resolver.resolve(directory, DateOption::parse_lenient(date_option));
    pump.drain();
    print_rows(&log);

    let target = result.map_err(DetectorError::from)?;
    println!("{}", target.display());
    Ok(())
}

async fn run_daemon(config: AppConfig) -> Result<()> {
    let (log, logger, pump) = ClientLog::channel(config.client_log.capacity);
    let settings = Arc::new(SettingsStore::default());
    let location = Arc::new(LocationStore::default());
    let recorder = Arc::new(RecorderState::default());
    let router = Arc::new(build_router(&config, logger.clone(), recorder.clone()));

    // Runs on this thread; rows from any thread are applied here.
    let pump_task = tokio::spawn(pump.run());

    let sources: Vec<Arc<dyn NotificationSource>> = vec![
        recorder.clone(),
        location.clone(),
        settings.clone(),
        log.clone(),
    ];
    let aggregator =
        ChangeAggregator::new(sources, config.push.tick_interval()).with_logger(logger.clone());
    let session = PushSession::new(aggregator, location.clone());
    let sink = JsonLineSink::new(tokio::io::stdout());

    logger.info(format!("{} started.", config.application.name));
    tracing::info!(
        tick_ms = config.push.tick_interval_ms,
        capacity = config.client_log.capacity,
        "Push daemon running, press Ctrl+C to stop"
    );

    let mut commands = BufReader::new(tokio::io::stdin()).lines();
    let mut commands_open = true;
    let push = session.run(&sink);
    tokio::pin!(push);

    loop {
        tokio::select! {
            result = &mut push => {
                result?;
                break;
            }
            line = commands.next_line(), if commands_open => match line {
                Ok(Some(line)) => {
                    let command = line.trim().to_string();
                    if !command.is_empty() {
                        // Dispatch concurrently so the push loop keeps flushing rows.
                        let router = Arc::clone(&router);
                        tokio::spawn(async move {
                            router.dispatch_text(&command).await;
                        });
                    }
                }
                Ok(None) => {
                    tracing::debug!("Command input closed");
                    commands_open = false;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Command input failed");
                    commands_open = false;
                }
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    tracing::info!("Push daemon shutting down");
    pump_task.abort();
    Ok(())
}
