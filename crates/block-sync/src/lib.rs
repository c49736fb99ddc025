//! block-sync: keeps an in-memory editor buffer and its markdown file of
//! record consistent while the file may change underneath it.
//!
//! This crate provides:
//! - `BlockContentSyncManager`: dirty tracking, debounced autosave, manual
//!   sync, conflict detection and post-write verification with rollback
//! - `BackupTriggerDetector`: decides when a safety copy is worth writing
//! - FileSystem, EditorSurface, DecisionProvider and Clock abstractions so
//!   hosts (Obsidian plugin, native daemon, tests) supply their own I/O

pub mod backup;
pub mod clock;
pub mod dialog;
pub mod editor;
pub mod events;
pub mod fs;
pub mod manager;
pub mod naming;
pub mod settings;
pub mod state;

pub use backup::{BackupReason, BackupTriggerDetector, BackupWriter, VaultBackupWriter};
pub use clock::{Clock, ManualClock, Millis, SystemClock};
pub use dialog::{ConflictDecision, DecisionProvider, SwitchDecision};
pub use editor::{ContentEquivalence, EditorSurface, MemoryEditor, NormalizedEquivalence};
pub use events::{EventBus, Notice, NoticeLevel, Subscription, SyncEvent};
pub use fs::{FileSystem, FsError, InMemoryFs};
pub use manager::{BlockContentSyncManager, ExternalOutcome, LoadOutcome, SaveOutcome, SyncError};
pub use settings::Settings;
pub use state::{SyncMode, SyncPhase, SyncResult, SyncState};
