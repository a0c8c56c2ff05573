//! End-to-end tests of the push loop against the real stores and client log.

use async_trait::async_trait;
use detector_live::error::SourceError;
use detector_live::notify::{
    BroadcastEvent, ChangeAggregator, ClientLog, EventHandle, NotificationSource, Section,
};
use detector_live::push::{ChannelSink, PushSession, StatusUpdate};
use detector_live::sources::{LocationStore, RecorderState, SettingsStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

async fn recv(rx: &mut mpsc::Receiver<StatusUpdate>) -> StatusUpdate {
    timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("push update timed out")
        .expect("push session ended")
}

#[tokio::test]
async fn test_push_loop_sends_only_changed_sections() {
    let (log, logger, pump) = ClientLog::channel(80);
    let settings = Arc::new(SettingsStore::default());
    let location = Arc::new(LocationStore::default());
    let recorder = Arc::new(RecorderState::default());
    tokio::spawn(pump.run());

    let sources: Vec<Arc<dyn NotificationSource>> = vec![
        recorder.clone(),
        location.clone(),
        settings.clone(),
        log.clone(),
    ];
    // Long tick: every update after the first is change-driven.
    let aggregator = ChangeAggregator::new(sources, Duration::from_secs(3600));
    let session = PushSession::new(aggregator, location.clone());

    let (tx, mut rx) = mpsc::channel(16);
    let sink = ChannelSink::new(tx);
    let task = tokio::spawn(async move { session.run(&sink).await });

    let first = recv(&mut rx).await;
    assert!(first.status.is_some());
    assert!(first.location.is_some());
    assert!(first.settings.is_some());
    assert!(first.log_rows.is_some());

    settings
        .save_settings(&json!({ "recMode": "rec-mode-auto" }))
        .unwrap();
    let update = recv(&mut rx).await;
    assert_eq!(update.settings.unwrap()["recMode"], "rec-mode-auto");
    assert!(update.status.is_none());
    assert!(update.location.is_none());
    assert!(update.log_rows.is_none());

    recorder.set_rec_status("Microphone is on.");
    let update = recv(&mut rx).await;
    let status = update.status.unwrap();
    assert_eq!(status["rec_status"], "Microphone is on.");
    assert!(status["detector_time"].is_string());
    assert!(update.settings.is_none());

    // Logged from another thread, applied by the pump on the scheduler.
    std::thread::spawn(move || logger.error("Microphone disconnected."))
        .join()
        .unwrap();
    let update = recv(&mut rx).await;
    let rows = update.log_rows.unwrap();
    assert!(rows[0]
        .as_str()
        .unwrap()
        .ends_with(" - Error: Microphone disconnected."));

    drop(rx);
    // The session notices the closed sink on its next send.
    settings.reset_to_defaults();
    let result = timeout(RECV_TIMEOUT, task).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_simultaneous_changes_arrive_together() {
    let settings = Arc::new(SettingsStore::default());
    let location = Arc::new(LocationStore::default());

    let sources: Vec<Arc<dyn NotificationSource>> = vec![settings.clone(), location.clone()];
    let aggregator = ChangeAggregator::new(sources, Duration::from_secs(3600));
    let mut session = PushSession::new(aggregator, location.clone());

    settings
        .save_settings(&json!({ "filenamePrefix": "pip" }))
        .unwrap();
    location
        .save_location(&json!({ "manualLatitudeDd": 57.66 }))
        .unwrap();

    let update = timeout(RECV_TIMEOUT, session.next_update()).await.unwrap();
    assert_eq!(update.settings.unwrap()["filenamePrefix"], "pip");
    assert_eq!(update.location.unwrap()["manualLatitudeDd"], 57.66);
}

#[tokio::test]
async fn test_tick_keeps_detector_time_fresh_without_recorder() {
    let location = Arc::new(LocationStore::default());
    let sources: Vec<Arc<dyn NotificationSource>> = vec![location.clone()];
    let aggregator = ChangeAggregator::new(sources, Duration::from_millis(20));
    let mut session = PushSession::new(aggregator, location);

    let update = timeout(RECV_TIMEOUT, session.next_update()).await.unwrap();
    let status = update.status.unwrap();
    assert!(status["detector_time"].is_string());
    assert_eq!(status["location_status"], "Lat/long: not set");
    assert!(update.location.is_none());
}

/// Settings source whose snapshot always fails.
struct BrokenSettings {
    event: BroadcastEvent,
}

#[async_trait]
impl NotificationSource for BrokenSettings {
    fn section(&self) -> Section {
        Section::Settings
    }

    fn current_event(&self) -> EventHandle {
        self.event.wait_handle()
    }

    async fn snapshot(&self) -> Result<serde_json::Value, SourceError> {
        Err(SourceError::snapshot("settings", "settings file unreadable"))
    }
}

#[tokio::test]
async fn test_failed_snapshot_becomes_feed_warning() {
    let (log, logger, mut pump) = ClientLog::channel(80);
    let location = Arc::new(LocationStore::default());
    let broken = Arc::new(BrokenSettings {
        event: BroadcastEvent::new(),
    });

    let sources: Vec<Arc<dyn NotificationSource>> = vec![broken.clone(), log.clone()];
    let aggregator =
        ChangeAggregator::new(sources, Duration::from_secs(3600)).with_logger(logger);
    let mut session = PushSession::new(aggregator, location);

    broken.event.broadcast();
    let update = timeout(RECV_TIMEOUT, session.next_update()).await.unwrap();
    assert!(update.settings.is_none());

    pump.drain();
    let rows = log.rows();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].ends_with(" - Warning: Snapshot of 'settings' failed: settings file unreadable"));

    // The warning row itself is pushed on the next round.
    let update = timeout(RECV_TIMEOUT, session.next_update()).await.unwrap();
    assert_eq!(update.log_rows.unwrap().as_array().unwrap().len(), 1);
    assert!(update.settings.is_none());
}
