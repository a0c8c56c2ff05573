//! Live mount and free-space queries.
//!
//! Removable media come and go while the detector runs, so nothing here is cached:
//! every call re-reads the disk list.

use std::io;
use std::path::{Path, PathBuf};
use sysinfo::Disks;

/// Capability: storage inspection
pub trait MountProbe: Send + Sync {
    /// Mounted filesystems that are direct children of `root`, in any order.
    fn removable_mounts(&self, root: &Path) -> Vec<PathBuf>;

    /// Whether `path` exists at all on this host.
    fn exists(&self, path: &Path) -> bool;

    /// Bytes available to unprivileged writers on the filesystem holding `path`.
    fn free_bytes(&self, path: &Path) -> io::Result<u64>;
}

/// `MountProbe` backed by the `sysinfo` disk list.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoProbe;

impl MountProbe for SysinfoProbe {
    fn removable_mounts(&self, root: &Path) -> Vec<PathBuf> {
        let disks = Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .map(|disk| disk.mount_point().to_path_buf())
            .filter(|mount| mount.parent() == Some(root))
            .collect()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn free_bytes(&self, path: &Path) -> io::Result<u64> {
        let path = path.canonicalize()?;
        let disks = Disks::new_with_refreshed_list();

        // The deepest mount point containing the path owns it.
        disks
            .list()
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(|disk| disk.available_space())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no mounted filesystem holds '{}'", path.display()),
                )
            })
    }
}
