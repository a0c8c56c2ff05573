//! Detector settings store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

use super::merge_update;
use crate::error::{SettingsError, SourceError};
use crate::notify::{BroadcastEvent, EventHandle, NotificationSource, Section};
use crate::storage::DateOption;

/// Recording and detection settings as edited from the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorSettings {
    pub rec_mode: String,
    pub file_directory: String,
    pub file_directory_date_option: String,
    pub filename_prefix: String,
    pub detection_limit_khz: f64,
    pub detection_sensitivity_dbfs: f64,
    pub detection_algorithm: String,
    pub rec_length_s: String,
    pub rec_type: String,
    pub feedback_on_off: String,
    pub feedback_volume: f64,
    pub feedback_pitch: f64,
    pub feedback_filter_low_khz: f64,
    pub feedback_filter_high_khz: f64,
    pub startup_option: String,
    pub scheduler_start_event: String,
    pub scheduler_start_adjust: f64,
    pub scheduler_stop_event: String,
    pub scheduler_stop_adjust: f64,
    pub scheduler_post_action: String,
    pub scheduler_post_action_delay: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            rec_mode: "rec-mode-off".to_string(),
            file_directory: "recordings".to_string(),
            file_directory_date_option: "date-pre-true".to_string(),
            filename_prefix: "bat".to_string(),
            detection_limit_khz: 17.0,
            detection_sensitivity_dbfs: -50.0,
            detection_algorithm: "detection-simple".to_string(),
            rec_length_s: "6".to_string(),
            rec_type: "FS".to_string(),
            feedback_on_off: "feedback-off".to_string(),
            feedback_volume: 100.0,
            feedback_pitch: 30.0,
            feedback_filter_low_khz: 15.0,
            feedback_filter_high_khz: 150.0,
            startup_option: "startup-off".to_string(),
            scheduler_start_event: "sunset".to_string(),
            scheduler_start_adjust: -15.0,
            scheduler_stop_event: "sunrise".to_string(),
            scheduler_stop_adjust: 15.0,
            scheduler_post_action: "post-none".to_string(),
            scheduler_post_action_delay: 5.0,
        }
    }
}

impl DetectorSettings {
    /// Date tagging requested for the recording directory.
    pub fn date_option(&self) -> DateOption {
        DateOption::parse_lenient(&self.file_directory_date_option)
    }
}

/// Owns the live `DetectorSettings` and broadcasts every change.
#[derive(Debug, Default)]
pub struct SettingsStore {
    current: Mutex<DetectorSettings>,
    event: BroadcastEvent,
}

impl SettingsStore {
    pub fn new(initial: DetectorSettings) -> Self {
        Self {
            current: Mutex::new(initial),
            event: BroadcastEvent::new(),
        }
    }

    pub fn settings(&self) -> DetectorSettings {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies a partial camelCase update; absent and null fields are kept.
    pub fn save_settings(&self, update: &Value) -> Result<DetectorSettings, SettingsError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let merged = merge_update(&*current, update)?;
        *current = merged.clone();
        drop(current);

        self.event.broadcast();
        Ok(merged)
    }

    pub fn save_rec_mode(&self, rec_mode: impl Into<String>) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rec_mode = rec_mode.into();
        self.event.broadcast();
    }

    pub fn reset_to_defaults(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = DetectorSettings::default();
        self.event.broadcast();
    }
}

#[async_trait]
impl NotificationSource for SettingsStore {
    fn section(&self) -> Section {
        Section::Settings
    }

    fn current_event(&self) -> EventHandle {
        self.event.wait_handle()
    }

    async fn snapshot(&self) -> Result<Value, SourceError> {
        serde_json::to_value(self.settings()).map_err(|e| SourceError::snapshot("settings", e))
    }
}
