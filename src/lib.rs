//! # Detector Live Status Library
//!
//! This crate is the live-status layer of a field-deployed bat detector. Independent
//! subsystems (the client log, settings, location and the recorder) announce their
//! changes through re-arming broadcast events; a per-client push loop fans those in
//! and sends partial status updates to the dashboard. Two standalone decision
//! components sit next to the notification flow: the recording storage target
//! resolver and the power command router.
//!
//! ## Crate Structure
//!
//! - **`config`**: `AppConfig`, loaded with `figment` from TOML plus `DETECTOR_` env vars.
//! - **`error`**: `DetectorError` and the per-component error enums.
//! - **`notify`**: the change-notification core: `BroadcastEvent`, `RingLog`, the client
//!   log with its cross-thread handoff, `NotificationSource` and `ChangeAggregator`.
//! - **`sources`**: in-memory settings, location and recorder stores.
//! - **`push`**: `PushSession`, the per-client loop emitting `StatusUpdate`s.
//! - **`storage`**: `StorageTargetResolver`, free-space based choice of the write target.
//! - **`power`**: `PowerCommandRouter`, OS-gated shutdown/reboot/clock commands.
//! - **`tracing_setup`**: process log initialization.
//!
//! ## Threading
//!
//! Everything that touches shared notification state runs on one cooperative
//! scheduler (a `current_thread` tokio runtime in the binary). Other threads reach
//! the dashboard only through `notify::ClientLogger`, whose rows are queued and
//! applied on the scheduler by `notify::LogPump`.

pub mod config;
pub mod error;
pub mod notify;
pub mod power;
pub mod push;
pub mod sources;
pub mod storage;
pub mod tracing_setup;

pub use config::AppConfig;
pub use error::{AppResult, DetectorError};
