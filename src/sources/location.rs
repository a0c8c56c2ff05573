//! Location store, fed by the dashboard and by the GPS receiver.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

use super::merge_update;
use crate::error::{SettingsError, SourceError};
use crate::notify::{BroadcastEvent, EventHandle, NotificationSource, Section};

/// Source of the position used for solar time calculations.
pub const GEO_SOURCE_GPS: &str = "geo-gps";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationSettings {
    pub geo_source: String,
    pub latitude_dd: f64,
    pub longitude_dd: f64,
    pub manual_latitude_dd: f64,
    pub manual_longitude_dd: f64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            geo_source: "geo-manual".to_string(),
            latitude_dd: 0.0,
            longitude_dd: 0.0,
            manual_latitude_dd: 0.0,
            manual_longitude_dd: 0.0,
        }
    }
}

impl LocationSettings {
    fn has_position(&self) -> bool {
        self.latitude_dd != 0.0 || self.longitude_dd != 0.0
    }
}

#[derive(Debug, Default)]
pub struct LocationStore {
    current: Mutex<LocationSettings>,
    event: BroadcastEvent,
}

impl LocationStore {
    pub fn new(initial: LocationSettings) -> Self {
        Self {
            current: Mutex::new(initial),
            event: BroadcastEvent::new(),
        }
    }

    pub fn location(&self) -> LocationSettings {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies a partial camelCase update from the dashboard.
    pub fn save_location(&self, update: &Value) -> Result<LocationSettings, SettingsError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let merged = merge_update(&*current, update)?;
        *current = merged.clone();
        drop(current);

        self.event.broadcast();
        Ok(merged)
    }

    /// Records a GPS fix. Only used while the geo source is GPS; broadcasts only
    /// when the position actually moved.
    pub fn update_gps_fix(&self, latitude_dd: f64, longitude_dd: f64) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.geo_source != GEO_SOURCE_GPS {
            return false;
        }
        if current.latitude_dd == latitude_dd && current.longitude_dd == longitude_dd {
            return false;
        }
        current.latitude_dd = latitude_dd;
        current.longitude_dd = longitude_dd;
        drop(current);

        self.event.broadcast();
        true
    }

    /// Short text for the status section.
    pub fn location_status(&self) -> String {
        let location = self.location();
        if !location.has_position() {
            return "Lat/long: not set".to_string();
        }
        format!(
            "Lat/long: {:.5}/{:.5} ({})",
            location.latitude_dd, location.longitude_dd, location.geo_source
        )
    }
}

#[async_trait]
impl NotificationSource for LocationStore {
    fn section(&self) -> Section {
        Section::Location
    }

    fn current_event(&self) -> EventHandle {
        self.event.wait_handle()
    }

    async fn snapshot(&self) -> Result<Value, SourceError> {
        serde_json::to_value(self.location()).map_err(|e| SourceError::snapshot("location", e))
    }
}
