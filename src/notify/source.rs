//! Notification source capability.
//!
//! Every subsystem that announces state changes to the dashboard (client log,
//! settings, location, recorder) implements `NotificationSource`. The aggregator
//! and the push loop depend only on this trait.
//!
//! # Contract
//! - `current_event()` returns the handle of the source's current broadcast round.
//!   It must be re-fetched after the handle fires.
//! - `snapshot()` returns the source's current state as an opaque JSON blob. A
//!   failure excludes the source from one push round only.

use async_trait::async_trait;
use std::fmt;

use super::event::EventHandle;
use crate::error::SourceError;

/// Section of the dashboard status update a source feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Recorder state, clock and location status.
    Status,
    /// Location settings.
    Location,
    /// Detector settings.
    Settings,
    /// Rendered feed rows, newest first.
    LogRows,
}

impl Section {
    /// Key of the section in a status update.
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Status => "status",
            Section::Location => "location",
            Section::Settings => "settings",
            Section::LogRows => "log_rows",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability: change notification
///
/// Implemented by each independent subsystem that owns a `BroadcastEvent`.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Section this source fills in a status update.
    fn section(&self) -> Section;

    /// Handle of the current broadcast round.
    fn current_event(&self) -> EventHandle;

    /// Current state of the source.
    async fn snapshot(&self) -> Result<serde_json::Value, SourceError>;
}
