//! Power command routing.
//!
//! Every outcome is written to the dashboard feed; nothing is returned as an error.
//! `CommandOutcome` lets callers tell an executed command from a logged no-op.

use chrono::{Local, TimeZone};
use std::sync::Arc;
use std::time::Duration;

use super::command::PowerCommand;
use super::control::{DetectorStatus, SystemControl};
use super::gate::OsGate;
use crate::notify::ClientLogger;

/// What happened to a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command ran (or the OS action was issued).
    Executed,
    /// Accepted but intentionally does nothing yet.
    NotImplemented,
    /// Refused before any OS action: unsupported host or unknown command.
    Rejected,
    /// The OS action was attempted and failed.
    Failed,
}

pub struct PowerCommandRouter {
    gate: OsGate,
    control: Arc<dyn SystemControl>,
    status: Arc<dyn DetectorStatus>,
    logger: ClientLogger,
    action_delay: Duration,
}

impl std::fmt::Debug for PowerCommandRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerCommandRouter")
            .field("gate", &self.gate)
            .field("action_delay", &self.action_delay)
            .finish()
    }
}

impl PowerCommandRouter {
    pub fn new(
        gate: OsGate,
        control: Arc<dyn SystemControl>,
        status: Arc<dyn DetectorStatus>,
        logger: ClientLogger,
    ) -> Self {
        Self {
            gate,
            control,
            status,
            logger,
            action_delay: Duration::from_secs(1),
        }
    }

    /// Delay between the "activated" log row and the shutdown/reboot itself.
    pub fn with_action_delay(mut self, delay: Duration) -> Self {
        self.action_delay = delay;
        self
    }

    /// Parses and dispatches command text from the dashboard.
    pub async fn dispatch_text(&self, command: &str) -> CommandOutcome {
        match command.parse::<PowerCommand>() {
            Ok(command) => self.dispatch(command).await,
            Err(e) => {
                self.logger.error(format!("Power command failed. {}", e));
                CommandOutcome::Rejected
            }
        }
    }

    pub async fn dispatch(&self, command: PowerCommand) -> CommandOutcome {
        if command.requires_supported_os() && !self.gate.is_supported(&self.logger) {
            self.logger.warning(format!(
                "Power command failed ({}), unsupported operating system.",
                command
            ));
            return CommandOutcome::Rejected;
        }

        match command {
            PowerCommand::StatusQuery => {
                for line in self.status.status_report().await {
                    self.logger.info(line);
                }
                CommandOutcome::Executed
            }
            PowerCommand::Shutdown | PowerCommand::Reboot => {
                self.logger
                    .info(format!("The command '{}' is activated.", command.label()));
                // Give the log row time to reach the dashboard.
                tokio::time::sleep(self.action_delay).await;

                let result = match command {
                    PowerCommand::Shutdown => self.control.shutdown().await,
                    _ => self.control.reboot().await,
                };
                match result {
                    Ok(()) => CommandOutcome::Executed,
                    Err(e) => {
                        self.logger
                            .error(format!("The command '{}' failed: {}", command.label(), e));
                        CommandOutcome::Failed
                    }
                }
            }
            PowerCommand::CopyStorage | PowerCommand::ClearStorage => {
                self.logger.info(format!(
                    "The command '{}' is not implemented.",
                    command.label()
                ));
                CommandOutcome::NotImplemented
            }
        }
    }

    /// Sets the detector clock from a client-supplied POSIX time in seconds.
    ///
    /// The clock is left untouched on any failure.
    pub async fn set_detector_time(&self, posix_time_s: i64, cmd_source: &str) -> CommandOutcome {
        let Some(local) = Local.timestamp_opt(posix_time_s, 0).single() else {
            self.logger.error(format!(
                "Detector time update failed, invalid time: {}",
                posix_time_s
            ));
            return CommandOutcome::Failed;
        };
        let time_text = local.format("%Y-%m-%d %H:%M:%S").to_string();

        let mut message = format!("Detector time update: {}", time_text);
        if !cmd_source.is_empty() {
            message.push_str(&format!(" ({}).", cmd_source));
        }
        self.logger.info(message);

        if !self.gate.is_supported(&self.logger) {
            self.logger
                .warning("Detector time update failed, unsupported operating system.");
            return CommandOutcome::Rejected;
        }

        match self.control.set_clock(&time_text).await {
            Ok(()) => CommandOutcome::Executed,
            Err(e) => {
                self.logger
                    .error(format!("Detector time update failed: {}", e));
                CommandOutcome::Failed
            }
        }
    }
}
