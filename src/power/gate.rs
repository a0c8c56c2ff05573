//! Operating system capability gate.
//!
//! Privileged commands only run on the supported OS image. The check reads the
//! os-release file once and remembers the answer for the life of the process,
//! since the running OS cannot change underneath it.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::PowerConfig;
use crate::notify::ClientLogger;

#[derive(Debug)]
pub struct OsGate {
    os_release_path: PathBuf,
    marker: String,
    supported: OnceLock<bool>,
}

impl OsGate {
    pub fn new(os_release_path: impl Into<PathBuf>, marker: impl Into<String>) -> Self {
        Self {
            os_release_path: os_release_path.into(),
            marker: marker.into(),
            supported: OnceLock::new(),
        }
    }

    pub fn from_config(config: &PowerConfig) -> Self {
        Self::new(config.os_release_path.clone(), config.os_marker.clone())
    }

    /// Gate with a fixed answer, skipping the file check.
    pub fn assume(supported: bool) -> Self {
        let gate = Self::new(PathBuf::new(), String::new());
        let _ = gate.supported.set(supported);
        gate
    }

    /// Whether privileged commands may run on this host.
    ///
    /// Read errors other than a missing file are logged once and count as
    /// unsupported.
    pub fn is_supported(&self, logger: &ClientLogger) -> bool {
        *self
            .supported
            .get_or_init(|| match read_marker(&self.os_release_path, &self.marker) {
                Ok(found) => found,
                Err(e) => {
                    logger.error(format!("OS check failed: {}", e));
                    false
                }
            })
    }
}

fn read_marker(path: &Path, marker: &str) -> io::Result<bool> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content.contains(marker)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
