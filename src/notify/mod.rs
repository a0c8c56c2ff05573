//! Change-notification core.
//!
//! - **`event`**: `BroadcastEvent`, the re-arming multi-waiter wake primitive.
//! - **`ring_log`**: `RingLog`, the bounded row buffer behind the dashboard feed.
//! - **`client_log`**: `ClientLog`/`ClientLogger`/`LogPump`, the feed plus its
//!   cross-thread handoff.
//! - **`source`**: the `NotificationSource` capability trait.
//! - **`aggregator`**: `ChangeAggregator`, race-to-first fan-in of sources and a tick.

pub mod aggregator;
pub mod client_log;
pub mod event;
pub mod ring_log;
pub mod source;

pub use aggregator::{ChangeAggregator, FiredSet};
pub use client_log::{ClientLog, ClientLogger, LogPump};
pub use event::{BroadcastEvent, EventHandle};
pub use ring_log::{LogRow, RingLog, Severity};
pub use source::{NotificationSource, Section};
