//! Recorder state as shown in the dashboard status section.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

use crate::error::SourceError;
use crate::notify::{BroadcastEvent, EventHandle, NotificationSource, Section};
use crate::power::DetectorStatus;

/// Status text used while the microphone stream is running.
pub const MICROPHONE_ON: &str = "Microphone is on.";

/// Recorder fields of the dashboard status section.
///
/// Serialized with snake_case keys, like the rest of the status section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderStatus {
    /// Human-readable recorder state.
    pub rec_status: String,
    /// Connected microphone, empty when none is found.
    pub device_name: String,
    /// Sampling frequency of the connected microphone.
    pub sampling_freq_hz: Option<u32>,
}

impl Default for RecorderStatus {
    fn default() -> Self {
        Self {
            rec_status: "Recording not started.".to_string(),
            device_name: String::new(),
            sampling_freq_hz: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecorderState {
    current: Mutex<RecorderStatus>,
    event: BroadcastEvent,
}

impl RecorderState {
    pub fn status(&self) -> RecorderStatus {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Updates the recorder status text. Returns whether anything changed.
    pub fn set_rec_status(&self, rec_status: impl Into<String>) -> bool {
        let rec_status = rec_status.into();
        self.update(|status| {
            if status.rec_status == rec_status {
                return false;
            }
            status.rec_status = rec_status;
            true
        })
    }

    /// Records the connected microphone, or `None` when it was unplugged.
    pub fn set_device(&self, device: Option<(String, u32)>) -> bool {
        let (device_name, sampling_freq_hz) = match device {
            Some((name, freq)) => (name, Some(freq)),
            None => (String::new(), None),
        };
        self.update(|status| {
            if status.device_name == device_name && status.sampling_freq_hz == sampling_freq_hz {
                return false;
            }
            status.device_name = device_name;
            status.sampling_freq_hz = sampling_freq_hz;
            true
        })
    }

    fn update(&self, apply: impl FnOnce(&mut RecorderStatus) -> bool) -> bool {
        let changed = apply(&mut self.current.lock().unwrap_or_else(PoisonError::into_inner));
        if changed {
            self.event.broadcast();
        }
        changed
    }
}

#[async_trait]
impl NotificationSource for RecorderState {
    fn section(&self) -> Section {
        Section::Status
    }

    fn current_event(&self) -> EventHandle {
        self.event.wait_handle()
    }

    async fn snapshot(&self) -> Result<Value, SourceError> {
        serde_json::to_value(self.status()).map_err(|e| SourceError::snapshot("status", e))
    }
}

#[async_trait]
impl DetectorStatus for RecorderState {
    async fn status_report(&self) -> Vec<String> {
        let status = self.status();
        if status.rec_status == MICROPHONE_ON {
            return Vec::new();
        }

        match status.sampling_freq_hz {
            Some(freq) if !status.device_name.is_empty() => vec![format!(
                "Connected microphone: {} Frequency: {} Hz.",
                status.device_name, freq
            )],
            _ => vec!["No microphone is found.".to_string()],
        }
    }
}
