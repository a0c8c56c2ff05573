//! Dashboard notification feed.
//!
//! `ClientLogger` is the producer side: a cheap, cloneable, `Send` handle that any
//! thread may use. Every call is written to the process log through `tracing`;
//! info/warning/error calls are also handed to the scheduler over an mpsc channel.
//! `LogPump` runs on the scheduler and applies the queued rows to the shared
//! `ClientLog`, which appends to its `RingLog` and broadcasts the change.
//!
//! Nothing in this module returns an error to a producer. When the feed itself
//! fails (closed channel, render failure) the row is written straight to stderr
//! and the failure of that write is ignored.

use async_trait::async_trait;
use chrono::Local;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

use super::event::{BroadcastEvent, EventHandle};
use super::ring_log::{LogRow, RingLog, Severity};
use super::source::{NotificationSource, Section};
use crate::error::SourceError;

/// Shared feed state: the row buffer plus its change event.
#[derive(Debug)]
pub struct ClientLog {
    ring: Mutex<RingLog>,
    event: BroadcastEvent,
}

/// Producer handle for the dashboard feed.
#[derive(Debug, Clone)]
pub struct ClientLogger {
    tx: mpsc::UnboundedSender<LogRow>,
}

/// Scheduler-side consumer that applies queued rows to the `ClientLog`.
#[derive(Debug)]
pub struct LogPump {
    rx: mpsc::UnboundedReceiver<LogRow>,
    log: Arc<ClientLog>,
}

impl ClientLog {
    /// Creates the feed, its producer handle and the pump that connects them.
    pub fn channel(capacity: usize) -> (Arc<ClientLog>, ClientLogger, LogPump) {
        let log = Arc::new(ClientLog {
            ring: Mutex::new(RingLog::new(capacity)),
            event: BroadcastEvent::new(),
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let pump = LogPump {
            rx,
            log: Arc::clone(&log),
        };
        (log, ClientLogger { tx }, pump)
    }

    /// Appends a row and announces the change.
    ///
    /// Only called from the scheduler (through `LogPump`).
    pub fn apply(&self, row: LogRow) {
        if let Err(e) = row.render() {
            fallback_write("render", &format!("{}: {}", e, row.text));
            return;
        }

        let appended = self
            .ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .append(row);
        if appended {
            self.event.broadcast();
        }
    }

    /// Rendered rows, newest first.
    pub fn rows(&self) -> Vec<String> {
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rendered()
    }

    /// Structured rows, newest first.
    pub fn entries(&self) -> Vec<LogRow> {
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Change event of the feed.
    pub fn event(&self) -> &BroadcastEvent {
        &self.event
    }
}

#[async_trait]
impl NotificationSource for ClientLog {
    fn section(&self) -> Section {
        Section::LogRows
    }

    fn current_event(&self) -> EventHandle {
        self.event.wait_handle()
    }

    async fn snapshot(&self) -> Result<serde_json::Value, SourceError> {
        serde_json::to_value(self.rows()).map_err(|e| SourceError::snapshot("log_rows", e))
    }
}

impl ClientLogger {
    /// Process log only; never shown on the dashboard.
    pub fn debug(&self, text: impl Into<String>) {
        self.log(Severity::Debug, text.into());
    }

    /// Plain feed row.
    pub fn info(&self, text: impl Into<String>) {
        self.log(Severity::Info, text.into());
    }

    /// Feed row prefixed with `Warning: `.
    pub fn warning(&self, text: impl Into<String>) {
        self.log(Severity::Warning, text.into());
    }

    /// Feed row prefixed with `Error: `.
    pub fn error(&self, text: impl Into<String>) {
        self.log(Severity::Error, text.into());
    }

    fn log(&self, severity: Severity, text: String) {
        match severity {
            Severity::Debug => tracing::debug!(target: "client_log", "{}", text),
            Severity::Info => tracing::info!(target: "client_log", "{}", text),
            Severity::Warning => tracing::warn!(target: "client_log", "{}", text),
            Severity::Error => tracing::error!(target: "client_log", "{}", text),
        }

        if !severity.reaches_client() {
            return;
        }

        let row = LogRow {
            timestamp: Local::now(),
            severity,
            text,
        };
        if let Err(mpsc::error::SendError(row)) = self.tx.send(row) {
            fallback_write("feed closed", &row.text);
        }
    }
}

impl LogPump {
    /// Applies rows until every `ClientLogger` is dropped.
    pub async fn run(mut self) {
        while let Some(row) = self.rx.recv().await {
            self.log.apply(row);
        }
        tracing::debug!("Client log pump stopped");
    }

    /// Applies every row queued so far without waiting. Returns the number applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(row) = self.rx.try_recv() {
            self.log.apply(row);
            applied += 1;
        }
        applied
    }
}

// Last-resort channel for the feed's own failures. Must not panic.
fn fallback_write(context: &str, text: &str) {
    let _ = writeln!(
        std::io::stderr().lock(),
        "client log failure ({}): {}",
        context,
        text
    );
}
