//! Fan-in of several notification sources plus a clock tick.
//!
//! `ChangeAggregator::await_next_change` suspends until the tick deadline passes
//! or any source's current broadcast round fires, whichever comes first. On resume
//! every handle is re-tested, so sources that fired together are all reported in
//! one `FiredSet`. Only the fired sources get a fresh handle; the others keep
//! waiting on their current round.
//!
//! Dropping an in-flight `await_next_change` future withdraws this aggregator's
//! registrations only. Other waiters of the same rounds are unaffected.
//!
//! A failed snapshot drops that section from the round. With a feed logger
//! attached, the first failure of a section also becomes a warning row; the
//! next one is reported only after the section has recovered.

use futures::future::select_all;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use super::client_log::ClientLogger;
use super::event::EventHandle;
use super::source::{NotificationSource, Section};

/// Result of one aggregator round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiredSet {
    /// The clock tick deadline passed.
    pub tick: bool,
    /// Sections whose source broadcast since the previous round.
    pub sources: Vec<Section>,
}

impl FiredSet {
    /// Whether `section`'s source fired in this round.
    pub fn contains(&self, section: Section) -> bool {
        self.sources.contains(&section)
    }

    /// Neither the tick nor any source fired.
    pub fn is_empty(&self) -> bool {
        !self.tick && self.sources.is_empty()
    }
}

/// Combines notification sources and a periodic tick into one suspend point.
pub struct ChangeAggregator {
    sources: Vec<Arc<dyn NotificationSource>>,
    handles: Vec<EventHandle>,
    tick_interval: Duration,
    next_tick: Instant,
    logger: Option<ClientLogger>,
    /// Sections whose last snapshot failed.
    failing: Mutex<HashSet<Section>>,
}

impl std::fmt::Debug for ChangeAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sections: Vec<_> = self.sources.iter().map(|s| s.section()).collect();
        f.debug_struct("ChangeAggregator")
            .field("sources", &sections)
            .field("tick_interval", &self.tick_interval)
            .finish()
    }
}

impl ChangeAggregator {
    /// Subscribes to the current round of every source.
    pub fn new(sources: Vec<Arc<dyn NotificationSource>>, tick_interval: Duration) -> Self {
        let handles = sources.iter().map(|s| s.current_event()).collect();
        Self {
            sources,
            handles,
            tick_interval,
            next_tick: Instant::now() + tick_interval,
            logger: None,
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Reports snapshot failures to the dashboard feed as well.
    pub fn with_logger(mut self, logger: ClientLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Sources in subscription order.
    pub fn sources(&self) -> &[Arc<dyn NotificationSource>] {
        &self.sources
    }

    /// Period of the clock tick.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Waits for the tick or the first source change, then reports everything
    /// that fired.
    pub async fn await_next_change(&mut self) -> FiredSet {
        let pending = !self.handles.iter().any(EventHandle::is_fired);

        if pending {
            let tick = tokio::time::sleep_until(self.next_tick);
            if self.handles.is_empty() {
                tick.await;
            } else {
                let waits = self.handles.iter().map(|h| Box::pin(h.wait()));
                tokio::select! {
                    _ = tick => {}
                    _ = select_all(waits) => {}
                }
            }
        }

        self.collect_fired()
    }

    /// Snapshots the given sections, skipping sources whose snapshot fails.
    pub async fn snapshots(&self, sections: &[Section]) -> Vec<(Section, serde_json::Value)> {
        let mut out = Vec::with_capacity(sections.len());
        for source in &self.sources {
            let section = source.section();
            if !sections.contains(&section) {
                continue;
            }
            match source.snapshot().await {
                Ok(value) => {
                    self.failing_sections().remove(&section);
                    out.push((section, value));
                }
                Err(e) => {
                    tracing::warn!(section = %section, error = %e, "Snapshot failed, section skipped");
                    if self.failing_sections().insert(section) {
                        if let Some(logger) = &self.logger {
                            logger.warning(e.to_string());
                        }
                    }
                }
            }
        }
        out
    }

    fn failing_sections(&self) -> std::sync::MutexGuard<'_, HashSet<Section>> {
        self.failing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn collect_fired(&mut self) -> FiredSet {
        let now = Instant::now();
        let tick = now >= self.next_tick;
        if tick {
            self.next_tick = now + self.tick_interval;
        }

        let mut sources = Vec::new();
        for (source, handle) in self.sources.iter().zip(self.handles.iter_mut()) {
            if handle.is_fired() {
                // Stale handles are never waited on again.
                *handle = source.current_event();
                let section = source.section();
                if !sources.contains(&section) {
                    sources.push(section);
                }
            }
        }

        FiredSet { tick, sources }
    }
}
