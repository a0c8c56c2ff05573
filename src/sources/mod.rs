//! In-memory state owners that announce their changes to the dashboard.
//!
//! Each store owns one `BroadcastEvent` and implements `NotificationSource`:
//!
//! - **`settings`**: detector settings edited from the dashboard.
//! - **`location`**: manual or GPS-derived position.
//! - **`recorder`**: recorder state and connected microphone.
//!
//! Persistence of these values is handled elsewhere; the stores only hold the live
//! copy and broadcast when it changes.

pub mod location;
pub mod recorder;
pub mod settings;

pub use location::{LocationSettings, LocationStore};
pub use recorder::{RecorderState, RecorderStatus};
pub use settings::{DetectorSettings, SettingsStore};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::SettingsError;

/// Overlays the non-null fields of a partial JSON update onto `current`.
///
/// Field names follow the serialized (camelCase) form. Unknown fields are ignored.
pub(crate) fn merge_update<T>(current: &T, update: &Value) -> Result<T, SettingsError>
where
    T: Serialize + DeserializeOwned,
{
    let Value::Object(fields) = update else {
        return Err(SettingsError::NotAnObject);
    };

    let mut merged = serde_json::to_value(current)?;
    if let Value::Object(target) = &mut merged {
        for (key, value) in fields {
            if !value.is_null() {
                target.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(serde_json::from_value(merged)?)
}
