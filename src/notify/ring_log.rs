//! Bounded buffer of human-readable status rows for the dashboard feed.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt::{self, Write};

/// Severity of a log call.
///
/// Only `Info`, `Warning` and `Error` rows reach the dashboard; `Debug` stays in
/// the process log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Process log only.
    Debug,
    /// Plain row.
    Info,
    /// Row prefixed with `Warning: `.
    Warning,
    /// Row prefixed with `Error: `.
    Error,
}

impl Severity {
    /// Whether rows of this severity are shown on the dashboard.
    pub fn reaches_client(self) -> bool {
        !matches!(self, Severity::Debug)
    }

    /// Prefix placed before the text of a rendered row.
    fn prefix(self) -> &'static str {
        match self {
            Severity::Warning => "Warning: ",
            Severity::Error => "Error: ",
            Severity::Debug | Severity::Info => "",
        }
    }
}

/// Represents a single feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    /// Local time of the log call.
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    /// Message text without prefix.
    pub text: String,
}

impl LogRow {
    /// Renders the row as `HH:MM:SS - [Severity: ]text`.
    pub fn render(&self) -> Result<String, fmt::Error> {
        let mut line = String::with_capacity(self.text.len() + 20);
        write!(
            line,
            "{} - {}{}",
            self.timestamp.format("%H:%M:%S"),
            self.severity.prefix(),
            self.text
        )?;
        Ok(line)
    }
}

/// A fixed-capacity, insertion-ordered row buffer. The oldest row is evicted first.
#[derive(Debug, Clone)]
pub struct RingLog {
    capacity: usize,
    rows: VecDeque<LogRow>,
}

impl RingLog {
    /// Creates an empty log. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            rows: VecDeque::with_capacity(capacity),
        }
    }

    /// Maximum number of rows kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of rows held.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no row has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, evicting the oldest one when over capacity.
    ///
    /// Returns `false` without touching the buffer for debug rows and empty text.
    pub fn append(&mut self, row: LogRow) -> bool {
        if !row.severity.reaches_client() || row.text.is_empty() {
            return false;
        }

        self.rows.push_back(row);
        while self.rows.len() > self.capacity {
            self.rows.pop_front();
        }
        true
    }

    /// Copy of the rows, newest first.
    pub fn snapshot(&self) -> Vec<LogRow> {
        self.rows.iter().rev().cloned().collect()
    }

    /// Rendered rows, newest first. Rows that fail to render are skipped.
    pub fn rendered(&self) -> Vec<String> {
        self.rows
            .iter()
            .rev()
            .filter_map(|row| row.render().ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(severity: Severity, text: &str) -> LogRow {
        LogRow {
            timestamp: Local.with_ymd_and_hms(2024, 5, 1, 21, 4, 5).unwrap(),
            severity,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_render_prefixes() {
        assert_eq!(
            row(Severity::Info, "Recording started.").render().unwrap(),
            "21:04:05 - Recording started."
        );
        assert_eq!(
            row(Severity::Warning, "Low battery.").render().unwrap(),
            "21:04:05 - Warning: Low battery."
        );
        assert_eq!(
            row(Severity::Error, "No microphone.").render().unwrap(),
            "21:04:05 - Error: No microphone."
        );
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = RingLog::new(3);
        for i in 0..4 {
            assert!(log.append(row(Severity::Info, &format!("row {i}"))));
        }

        assert_eq!(log.len(), 3);
        let texts: Vec<_> = log.snapshot().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["row 3", "row 2", "row 1"]);
    }

    #[test]
    fn test_debug_and_empty_rows_ignored() {
        let mut log = RingLog::new(5);
        assert!(!log.append(row(Severity::Debug, "internal detail")));
        assert!(!log.append(row(Severity::Info, "")));
        assert!(log.is_empty());
    }

    #[test]
    fn test_rendered_newest_first() {
        let mut log = RingLog::new(80);
        log.append(row(Severity::Info, "first"));
        log.append(row(Severity::Error, "second"));

        assert_eq!(
            log.rendered(),
            vec!["21:04:05 - Error: second", "21:04:05 - first"]
        );
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut log = RingLog::new(2);
        log.append(row(Severity::Info, "a"));
        let snapshot = log.snapshot();
        log.append(row(Severity::Info, "b"));
        log.append(row(Severity::Info, "c"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].text, "a");
    }
}
