//! Recording storage target selection.
//!
//! - **`date_tag`**: `DateOption`, the date prefix/suffix transform for directory names.
//! - **`probe`**: `MountProbe`, live mount and free-space queries (`sysinfo` backed).
//! - **`resolver`**: `StorageTargetResolver`, the prioritized threshold walk.

pub mod date_tag;
pub mod probe;
pub mod resolver;

pub use date_tag::DateOption;
pub use probe::{MountProbe, SysinfoProbe};
pub use resolver::{select_target, MountKind, StorageTarget, StorageTargetResolver};
