//! Device power and clock commands.
//!
//! - **`command`**: `PowerCommand`, the accepted command set.
//! - **`gate`**: `OsGate`, the memoized OS identity check.
//! - **`control`**: `SystemControl` / `DetectorStatus` capability traits and the
//!   `sudo`-based `ShellControl`.
//! - **`router`**: `PowerCommandRouter`, gate-then-dispatch with logged outcomes.

pub mod command;
pub mod control;
pub mod gate;
pub mod router;

pub use command::{PowerCommand, UnknownCommand};
pub use control::{DetectorStatus, ShellControl, SystemControl};
pub use gate::OsGate;
pub use router::{CommandOutcome, PowerCommandRouter};
