//! Custom error types for the application.
//!
//! This module defines the primary error type, `DetectorError`, plus the narrower
//! error enums each component returns at its boundary. Using the `thiserror` crate,
//! it provides a centralized and consistent way to handle the failures that can
//! occur in the live-status layer.
//!
//! ## Error Hierarchy
//!
//! - **`StorageError`**: Returned by the storage target resolver. `Unavailable` is the
//!   resource-exhaustion case: no candidate mount has enough free space.
//! - **`SourceError`**: A notification source failed to produce its snapshot. These are
//!   transient and only cause one section to be skipped for one push round.
//! - **`SettingsError`**: A partial settings or location update did not match the schema.
//! - **`PushError`**: The push transport failed. `Disconnected` ends a push session
//!   without being treated as a fault.
//! - **`DetectorError`**: Top-level error used by the binary and by setup code, with
//!   `#[from]` conversions from the component errors so `?` works across layers.
//!
//! Power commands never return an error: capability violations and OS failures are
//! logged and reported through `power::CommandOutcome` instead.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, DetectorError>;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Push error: {0}")]
    Push(#[from] PushError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Tracing setup error: {0}")]
    Tracing(String),
}

/// Failures of the storage target resolver.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("No storage target with enough free space is available")]
    Unavailable,

    #[error("Failed to query free space for '{path}': {source}")]
    Probe {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A notification source could not produce its current snapshot.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Snapshot of '{section}' failed: {reason}")]
    Snapshot { section: String, reason: String },
}

/// A settings or location update could not be applied.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Invalid update: {0}")]
    InvalidUpdate(#[from] serde_json::Error),

    #[error("Update must be a JSON object")]
    NotAnObject,
}

/// Failures of the push transport.
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Client disconnected")]
    Disconnected,

    #[error("Failed to encode status update: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SourceError {
    /// Builds a snapshot failure for the named section.
    pub fn snapshot(section: impl Into<String>, reason: impl ToString) -> Self {
        SourceError::Snapshot {
            section: section.into(),
            reason: reason.to_string(),
        }
    }
}
