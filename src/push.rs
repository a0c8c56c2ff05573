//! Live push of dashboard status updates.
//!
//! A `PushSession` is created per connected client. It first sends every section,
//! then loops on its `ChangeAggregator` and sends only the sections that changed.
//! The status section is also refreshed on every clock tick so the detector time
//! shown on the dashboard keeps moving.
//!
//! Delivery is best effort. When the sink reports `Disconnected` the session ends;
//! nothing is buffered for the client.

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};

use crate::error::PushError;
use crate::notify::{ChangeAggregator, FiredSet, Section};
use crate::sources::LocationStore;

/// One push message. Sections that did not change are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_rows: Option<Value>,
}

impl StatusUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.location.is_none()
            && self.settings.is_none()
            && self.log_rows.is_none()
    }

    fn set(&mut self, section: Section, value: Value) {
        let slot = match section {
            Section::Status => &mut self.status,
            Section::Location => &mut self.location,
            Section::Settings => &mut self.settings,
            Section::LogRows => &mut self.log_rows,
        };
        *slot = Some(value);
    }
}

/// Transport for status updates.
#[async_trait]
pub trait UpdateSink: Send + Sync {
    /// Delivers one update. `PushError::Disconnected` means the client is gone.
    async fn send(&self, update: &StatusUpdate) -> Result<(), PushError>;
}

/// Sink backed by a bounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<StatusUpdate>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<StatusUpdate>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl UpdateSink for ChannelSink {
    async fn send(&self, update: &StatusUpdate) -> Result<(), PushError> {
        self.tx
            .send(update.clone())
            .await
            .map_err(|_| PushError::Disconnected)
    }
}

/// Sink writing one JSON document per line, e.g. to stdout.
pub struct JsonLineSink<W> {
    writer: Mutex<W>,
}

impl<W> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl<W> UpdateSink for JsonLineSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, update: &StatusUpdate) -> Result<(), PushError> {
        let mut line = serde_json::to_vec(update)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        let written = match writer.write_all(&line).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };
        written.map_err(|e| {
            tracing::debug!(error = %e, "Push writer closed");
            PushError::Disconnected
        })
    }
}

/// Per-client push loop.
pub struct PushSession {
    aggregator: ChangeAggregator,
    location: Arc<LocationStore>,
}

impl std::fmt::Debug for PushSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushSession")
            .field("aggregator", &self.aggregator)
            .finish()
    }
}

impl PushSession {
    pub fn new(aggregator: ChangeAggregator, location: Arc<LocationStore>) -> Self {
        Self {
            aggregator,
            location,
        }
    }

    /// Update carrying every section.
    pub async fn full_update(&self) -> StatusUpdate {
        let sections: Vec<Section> = self
            .aggregator
            .sources()
            .iter()
            .map(|s| s.section())
            .collect();
        self.build_update(&sections, true).await
    }

    /// Waits for the next change and builds the partial update for it.
    ///
    /// May return an empty update when the only fired source failed its snapshot.
    pub async fn next_update(&mut self) -> StatusUpdate {
        let FiredSet { tick, sources } = self.aggregator.await_next_change().await;
        self.build_update(&sources, tick).await
    }

    /// Runs until the sink disconnects.
    ///
    /// A disconnect is the normal end of a session and returns `Ok`.
    pub async fn run<S>(mut self, sink: &S) -> Result<(), PushError>
    where
        S: UpdateSink + ?Sized,
    {
        let first = self.full_update().await;
        if !Self::deliver(sink, &first).await? {
            return Ok(());
        }

        loop {
            let update = self.next_update().await;
            if update.is_empty() {
                continue;
            }
            if !Self::deliver(sink, &update).await? {
                return Ok(());
            }
        }
    }

    /// Returns `Ok(false)` once the client is gone.
    async fn deliver<S>(sink: &S, update: &StatusUpdate) -> Result<bool, PushError>
    where
        S: UpdateSink + ?Sized,
    {
        match sink.send(update).await {
            Ok(()) => Ok(true),
            Err(PushError::Disconnected) => {
                tracing::debug!("Push client disconnected");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn build_update(&self, fired: &[Section], tick: bool) -> StatusUpdate {
        let want_status = tick || fired.contains(&Section::Status);
        let mut sections = fired.to_vec();
        if want_status && !sections.contains(&Section::Status) {
            sections.push(Section::Status);
        }

        let mut update = StatusUpdate::default();
        let mut status_snapshot = None;
        for (section, value) in self.aggregator.snapshots(&sections).await {
            if section == Section::Status {
                status_snapshot = Some(value);
            } else {
                update.set(section, value);
            }
        }

        if want_status {
            let has_status_source = self
                .aggregator
                .sources()
                .iter()
                .any(|s| s.section() == Section::Status);
            let base = match status_snapshot {
                Some(value) => Some(value),
                // No recorder attached: time and location still go out.
                None if !has_status_source => Some(Value::Object(Default::default())),
                None => None,
            };
            if let Some(base) = base {
                update.status = Some(self.decorate_status(base));
            }
        }

        update
    }

    fn decorate_status(&self, base: Value) -> Value {
        let mut status = match base {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("recorder".to_string(), other);
                map
            }
        };
        status.insert(
            "detector_time".to_string(),
            Value::String(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        );
        status.insert(
            "location_status".to_string(),
            Value::String(self.location.location_status()),
        );
        Value::Object(status)
    }
}
