//! Process log setup.
//!
//! Every severity call made through `notify::ClientLogger` lands here as a
//! `tracing` event; only info/warning/error additionally reach the dashboard
//! feed. The `[application]` config section picks the level, the output format
//! (`pretty`, `compact` or `json`) and whether events carry file and line.
//! `RUST_LOG` overrides the configured level.
//!
//! Output goes to stderr; stdout carries the push stream in daemon mode.
//!
//! # Example
//! ```no_run
//! use detector_live::{config::AppConfig, tracing_setup};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! tracing_setup::init_from_config(&config)?;
//! tracing::info!("Application started");
//! # Ok(())
//! # }
//! ```

use crate::config::AppConfig;
use std::fmt;
use std::io::IsTerminal;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    fmt as tracing_fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer,
};

/// Process log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Multi-line, colored when stderr is a terminal (development)
    Pretty,
    /// One line per event without colors (device console, journald)
    #[default]
    Compact,
    /// One JSON object per event (log shipping)
    Json,
}

impl OutputFormat {
    /// Config spelling of the format.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Pretty => "pretty",
            OutputFormat::Compact => "compact",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            "compact" => Ok(OutputFormat::Compact),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Invalid log_format '{}'. Must be one of: pretty, compact, json",
                s
            )),
        }
    }
}

/// Resolved process log options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level used when `RUST_LOG` is unset.
    pub level: Level,
    /// Line format.
    pub format: OutputFormat,
    /// Add source file and line to each event.
    pub source_location: bool,
}

impl TracingConfig {
    /// Reads level, format and source location from `[application]`.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, String> {
        Ok(Self {
            level: parse_log_level(&config.application.log_level)?,
            format: config.application.log_format.parse()?,
            source_location: config.application.log_source_location,
        })
    }
}

/// Initialize tracing from the application configuration
pub fn init_from_config(config: &AppConfig) -> Result<(), String> {
    init(TracingConfig::from_app_config(config)?)
}

/// Installs the global subscriber.
///
/// A subscriber installed earlier (tests, an embedding binary) is kept and
/// `Ok(())` returned.
pub fn init(config: TracingConfig) -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string().to_lowercase()));
    let location = config.source_location;

    // Log calls arrive from recorder and GPS threads as well as the scheduler.
    let result = match config.format {
        OutputFormat::Pretty => {
            let fmt_layer = tracing_fmt::layer()
                .with_writer(std::io::stderr)
                .pretty()
                .with_file(location)
                .with_line_number(location)
                .with_thread_names(true)
                .with_ansi(std::io::stderr().is_terminal())
                .with_filter(env_filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
        OutputFormat::Compact => {
            let fmt_layer = tracing_fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_file(location)
                .with_line_number(location)
                .with_thread_names(true)
                .with_ansi(false)
                .with_filter(env_filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
        OutputFormat::Json => {
            let fmt_layer = tracing_fmt::layer()
                .with_writer(std::io::stderr)
                .json()
                .with_file(location)
                .with_line_number(location)
                .with_thread_names(true)
                .with_filter(env_filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
    };

    result.or_else(already_initialized_is_ok)
}

fn already_initialized_is_ok(e: TryInitError) -> Result<(), String> {
    if e.to_string()
        .contains("a global default trace dispatcher has already been set")
    {
        Ok(())
    } else {
        Err(format!("Failed to initialize tracing: {}", e))
    }
}

/// Parses a case-insensitive level name.
pub fn parse_log_level(level: &str) -> Result<Level, String> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(format!(
            "Invalid log_level '{}'. Must be one of: trace, debug, info, warn, error",
            level
        )),
    }
}
