//! Device commands accepted from the admin page.

use std::fmt;
use std::str::FromStr;

/// A state-changing (or status) command for the detector host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerCommand {
    /// `rpi_shutdown`
    Shutdown,
    /// `rpi_reboot`
    Reboot,
    /// `rpi_sd_to_usb`, not implemented on the device.
    CopyStorage,
    /// `rpi_clear_sd`, not implemented on the device.
    ClearStorage,
    /// `rpi_status`
    StatusQuery,
}

impl PowerCommand {
    /// Wire name used by the dashboard.
    pub fn as_str(self) -> &'static str {
        match self {
            PowerCommand::Shutdown => "rpi_shutdown",
            PowerCommand::Reboot => "rpi_reboot",
            PowerCommand::CopyStorage => "rpi_sd_to_usb",
            PowerCommand::ClearStorage => "rpi_clear_sd",
            PowerCommand::StatusQuery => "rpi_status",
        }
    }

    /// Everything except the status query needs the supported host.
    pub fn requires_supported_os(self) -> bool {
        !matches!(self, PowerCommand::StatusQuery)
    }

    /// Human-readable name used in log rows.
    pub fn label(self) -> &'static str {
        match self {
            PowerCommand::Shutdown => "Shutdown",
            PowerCommand::Reboot => "Reboot",
            PowerCommand::CopyStorage => "Copy SD to USB",
            PowerCommand::ClearStorage => "Clear SD card",
            PowerCommand::StatusQuery => "Status",
        }
    }
}

impl fmt::Display for PowerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned for command text that names no known command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Not a valid command: {}", self.0)
    }
}

impl std::error::Error for UnknownCommand {}

impl FromStr for PowerCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rpi_shutdown" => Ok(PowerCommand::Shutdown),
            "rpi_reboot" => Ok(PowerCommand::Reboot),
            "rpi_sd_to_usb" => Ok(PowerCommand::CopyStorage),
            "rpi_clear_sd" => Ok(PowerCommand::ClearStorage),
            "rpi_status" => Ok(PowerCommand::StatusQuery),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}
