//! OS-level side effects and status reporting used by the router.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use tokio::process::Command;

/// Capability: host control
///
/// # Contract
/// - Each call performs the OS action or returns the reason it could not.
/// - Callers gate every call on `OsGate`; implementations do not re-check.
#[async_trait]
pub trait SystemControl: Send + Sync {
    async fn shutdown(&self) -> io::Result<()>;

    async fn reboot(&self) -> io::Result<()>;

    /// Sets the system clock from local time text (`%Y-%m-%d %H:%M:%S`).
    async fn set_clock(&self, local_time: &str) -> io::Result<()>;
}

/// Capability: status reporting
///
/// Lines describing the detector's hardware state, logged on a status query.
#[async_trait]
pub trait DetectorStatus: Send + Sync {
    async fn status_report(&self) -> Vec<String>;
}

/// `SystemControl` that shells out through `sudo`.
#[derive(Debug, Clone)]
pub struct ShellControl {
    work_dir: PathBuf,
}

impl ShellControl {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    async fn sudo(&self, args: &[&str]) -> io::Result<()> {
        tracing::debug!(?args, work_dir = %self.work_dir.display(), "Running sudo");
        let status = Command::new("sudo")
            .args(args)
            .current_dir(&self.work_dir)
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("'sudo {}' exited with {}", args.join(" "), status),
            ))
        }
    }
}

#[async_trait]
impl SystemControl for ShellControl {
    async fn shutdown(&self) -> io::Result<()> {
        self.sudo(&["shutdown", "-h", "now"]).await
    }

    async fn reboot(&self) -> io::Result<()> {
        self.sudo(&["reboot"]).await
    }

    async fn set_clock(&self, local_time: &str) -> io::Result<()> {
        self.sudo(&["date", "--set", local_time]).await
    }
}
