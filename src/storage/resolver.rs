//! Storage target resolution for new recordings.
//!
//! Candidates are walked in a fixed order: mounted removable media sorted by
//! name, then internal storage. The first candidate whose *live* free space meets
//! its threshold wins. There is no "most free space" optimisation; the order is
//! deterministic so operators can predict where files go.

use chrono::{Local, NaiveDateTime};
use std::path::PathBuf;
use std::sync::Arc;

use super::date_tag::DateOption;
use super::probe::{MountProbe, SysinfoProbe};
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::notify::ClientLogger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
    /// USB memory or SD card under the removable root.
    Removable,
    /// Device's own storage.
    Internal,
}

/// One candidate location for recordings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTarget {
    /// Mount point of the filesystem.
    pub mount_path: PathBuf,
    /// Target is skipped below this much free space.
    pub min_free_bytes: u64,
    pub kind: MountKind,
    /// Directory under the mount that recordings go into.
    pub subdir: Option<PathBuf>,
}

impl StorageTarget {
    pub fn removable(mount_path: impl Into<PathBuf>, min_free_bytes: u64) -> Self {
        Self {
            mount_path: mount_path.into(),
            min_free_bytes,
            kind: MountKind::Removable,
            subdir: None,
        }
    }

    pub fn internal(
        mount_path: impl Into<PathBuf>,
        subdir: Option<PathBuf>,
        min_free_bytes: u64,
    ) -> Self {
        Self {
            mount_path: mount_path.into(),
            min_free_bytes,
            kind: MountKind::Internal,
            subdir,
        }
    }

    fn target_dir(&self, directory: &str) -> PathBuf {
        let mut path = self.mount_path.clone();
        if let Some(subdir) = &self.subdir {
            path.push(subdir);
        }
        path.push(directory);
        path
    }
}

/// Picks the first candidate, in the given order, with enough live free space.
///
/// A candidate whose free space cannot be read is skipped.
pub fn select_target(
    candidates: &[StorageTarget],
    directory: &str,
    probe: &dyn MountProbe,
) -> Option<PathBuf> {
    for candidate in candidates {
        match probe.free_bytes(&candidate.mount_path) {
            Ok(free) if free >= candidate.min_free_bytes => {
                return Some(candidate.target_dir(directory));
            }
            Ok(free) => {
                tracing::debug!(
                    mount = %candidate.mount_path.display(),
                    free,
                    required = candidate.min_free_bytes,
                    "Storage candidate below threshold"
                );
            }
            Err(e) => {
                let err = StorageError::Probe {
                    path: candidate.mount_path.display().to_string(),
                    source: e,
                };
                tracing::warn!(error = %err, "Storage candidate skipped");
            }
        }
    }
    None
}

/// Resolves the directory new recordings are written to.
#[derive(Clone)]
pub struct StorageTargetResolver {
    config: StorageConfig,
    probe: Arc<dyn MountProbe>,
    logger: ClientLogger,
}

impl std::fmt::Debug for StorageTargetResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageTargetResolver")
            .field("config", &self.config)
            .finish()
    }
}

impl StorageTargetResolver {
    /// Resolver using the host's disk list.
    pub fn new(config: StorageConfig, logger: ClientLogger) -> Self {
        Self::with_probe(config, Arc::new(SysinfoProbe), logger)
    }

    pub fn with_probe(
        config: StorageConfig,
        probe: Arc<dyn MountProbe>,
        logger: ClientLogger,
    ) -> Self {
        Self {
            config,
            probe,
            logger,
        }
    }

    /// Current candidate list: removable media by name, then internal storage
    /// when it exists on this host.
    pub fn candidates(&self) -> Vec<StorageTarget> {
        let mut removable = self.probe.removable_mounts(&self.config.removable_root);
        removable.sort();

        let threshold = self.config.removable_min_free_bytes();
        let mut candidates: Vec<_> = removable
            .into_iter()
            .map(|mount| StorageTarget::removable(mount, threshold))
            .collect();

        if self.probe.exists(&self.config.internal_path) {
            let subdir = Some(self.config.internal_subdir.clone())
                .filter(|dir| !dir.as_os_str().is_empty());
            candidates.push(StorageTarget::internal(
                self.config.internal_path.clone(),
                subdir,
                self.config.internal_min_free_bytes(),
            ));
        }
        candidates
    }

    /// Resolves the target for `file_directory` tagged with today's date option.
    pub fn resolve(
        &self,
        file_directory: &str,
        date_option: DateOption,
    ) -> Result<PathBuf, StorageError> {
        self.resolve_at(file_directory, date_option, Local::now().naive_local())
    }

    /// As `resolve`, with an explicit local time for the date tag.
    pub fn resolve_at(
        &self,
        file_directory: &str,
        date_option: DateOption,
        now: NaiveDateTime,
    ) -> Result<PathBuf, StorageError> {
        let directory = date_option.apply(file_directory, now);

        if let Some(path) = select_target(&self.candidates(), &directory, self.probe.as_ref()) {
            tracing::debug!(target_dir = %path.display(), "Storage target resolved");
            return Ok(path);
        }

        let internal = &self.config.internal_path;
        if self.probe.exists(internal) {
            match self.probe.free_bytes(internal) {
                Ok(_) => self.logger.error("Not enough space left on internal storage."),
                Err(e) => self.logger.error(format!(
                    "Failed to read free space on internal storage: {}",
                    e
                )),
            }
            return Err(StorageError::Unavailable);
        }

        // Not running on the device: keep recordings next to the process.
        Ok(self.config.fallback_dir.join(directory))
    }
}
