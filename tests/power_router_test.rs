//! Power command routing with a recording system control and a real OS gate file.

use async_trait::async_trait;
use detector_live::notify::{ClientLog, Severity};
use detector_live::power::{CommandOutcome, OsGate, PowerCommandRouter, SystemControl};
use detector_live::sources::RecorderState;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingControl {
    calls: Mutex<Vec<String>>,
}

impl RecordingControl {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SystemControl for RecordingControl {
    async fn shutdown(&self) -> io::Result<()> {
        self.calls.lock().unwrap().push("shutdown".into());
        Ok(())
    }

    async fn reboot(&self) -> io::Result<()> {
        self.calls.lock().unwrap().push("reboot".into());
        Ok(())
    }

    async fn set_clock(&self, local_time: &str) -> io::Result<()> {
        self.calls.lock().unwrap().push(format!("date {}", local_time));
        Ok(())
    }
}

fn os_release(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[tokio::test]
async fn test_shutdown_on_foreign_os_logs_one_warning() {
    let release = os_release("ID=ubuntu\nVERSION_ID=\"22.04\"\n");
    let control = Arc::new(RecordingControl::default());
    let (log, logger, mut pump) = ClientLog::channel(80);
    let router = PowerCommandRouter::new(
        OsGate::new(release.path(), "raspbian"),
        control.clone(),
        Arc::new(RecorderState::default()),
        logger,
    )
    .with_action_delay(Duration::ZERO);

    let outcome = router.dispatch_text("rpi_shutdown").await;
    pump.drain();

    assert_eq!(outcome, CommandOutcome::Rejected);
    assert!(control.calls().is_empty());
    let rows = log.entries();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].severity, Severity::Warning);
}

#[tokio::test]
async fn test_commands_on_supported_os() {
    let release = os_release("ID=raspbian\nID_LIKE=debian\n");
    let control = Arc::new(RecordingControl::default());
    let recorder = Arc::new(RecorderState::default());
    let (log, logger, mut pump) = ClientLog::channel(80);
    let router = PowerCommandRouter::new(
        OsGate::new(release.path(), "raspbian"),
        control.clone(),
        recorder.clone(),
        logger,
    )
    .with_action_delay(Duration::ZERO);

    assert_eq!(router.dispatch_text("rpi_reboot").await, CommandOutcome::Executed);
    assert_eq!(
        router.dispatch_text("rpi_sd_to_usb").await,
        CommandOutcome::NotImplemented
    );

    recorder.set_device(Some(("UltraMic 250K".to_string(), 250000)));
    assert_eq!(router.dispatch_text("rpi_status").await, CommandOutcome::Executed);
    pump.drain();

    assert_eq!(control.calls(), vec!["reboot"]);
    let rows = log.rows();
    assert!(rows[0].ends_with(" - Connected microphone: UltraMic 250K Frequency: 250000 Hz."));
    assert!(rows[1].ends_with(" - The command 'Copy SD to USB' is not implemented."));
    assert!(rows[2].ends_with(" - The command 'Reboot' is activated."));
}

#[tokio::test]
async fn test_missing_os_release_rejects_clock_update() {
    let dir = tempfile::tempdir().unwrap();
    let control = Arc::new(RecordingControl::default());
    let (log, logger, mut pump) = ClientLog::channel(80);
    let router = PowerCommandRouter::new(
        OsGate::new(dir.path().join("os-release"), "raspbian"),
        control.clone(),
        Arc::new(RecorderState::default()),
        logger,
    );

    let outcome = router.set_detector_time(1_714_590_000, "by user").await;
    pump.drain();

    assert_eq!(outcome, CommandOutcome::Rejected);
    assert!(control.calls().is_empty());
    let severities: Vec<_> = log.entries().iter().map(|row| row.severity).collect();
    assert_eq!(severities, vec![Severity::Warning, Severity::Info]);
}
