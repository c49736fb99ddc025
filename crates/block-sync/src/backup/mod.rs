//! Safety copies written before risky overwrites.
//!
//! - `trigger`: decides *whether* a save deserves a backup, and why
//! - `writer`: durably stores the before/after pair

pub mod trigger;
pub mod writer;

pub use trigger::{BackupInput, BackupReason, BackupTriggerDetector, TriggerConfig};
pub use writer::{BackupError, BackupPair, BackupWriter, VaultBackupWriter};
