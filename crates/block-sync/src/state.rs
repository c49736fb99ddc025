//! Observable sync state and the phase machine behind it.
//!
//! `SyncPhase` is the single source of truth for "is there unsaved work" and
//! "is something modal in progress". The flags collaborators see on
//! `SyncState` are derived from it, so combinations such as "saving while a
//! conflict dialog is open" cannot be represented.

use crate::clock::Millis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether local edits schedule an automatic save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    #[default]
    Auto,
    Manual,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Auto => f.write_str("auto"),
            SyncMode::Manual => f.write_str("manual"),
        }
    }
}

/// Outcome of the most recent save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncResult {
    Ok,
    Error,
}

/// Read-only snapshot handed to collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub mode: SyncMode,
    pub dirty: bool,
    pub saving: bool,
    pub last_saved_at: Option<Millis>,
    pub current_file_path: Option<String>,
    pub last_sync_result: Option<SyncResult>,
    pub last_sync_message: Option<String>,
}

/// Where the manager is in its lifecycle for the bound file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// Live content matches a baseline.
    #[default]
    Clean,
    /// Unsaved edits; in auto mode a save may be due at `save_due_at`.
    Dirty { save_due_at: Option<Millis> },
    /// A write + verify cycle is in flight.
    Saving,
    /// The conflict dialog is open. `dirty` is the flag to restore on cancel.
    Conflict { dirty: bool },
    /// The file-switch dialog is open. Only reachable with unsaved edits.
    Switching,
}

/// A transition was requested while a modal phase is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Busy(pub SyncPhase);

impl SyncPhase {
    pub fn is_dirty(&self) -> bool {
        match self {
            SyncPhase::Clean => false,
            SyncPhase::Dirty { .. } | SyncPhase::Saving | SyncPhase::Switching => true,
            SyncPhase::Conflict { dirty } => *dirty,
        }
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, SyncPhase::Saving)
    }

    /// Saving, resolving a conflict, or confirming a switch.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SyncPhase::Saving | SyncPhase::Conflict { .. } | SyncPhase::Switching
        )
    }

    pub fn save_due_at(&self) -> Option<Millis> {
        match self {
            SyncPhase::Dirty { save_due_at } => *save_due_at,
            _ => None,
        }
    }

    /// Record a local edit. `save_due_at` replaces any earlier deadline, which
    /// is what coalesces a burst of edits into one save.
    pub fn edited(self, save_due_at: Option<Millis>) -> SyncPhase {
        match self {
            SyncPhase::Clean | SyncPhase::Dirty { .. } => SyncPhase::Dirty { save_due_at },
            busy => busy,
        }
    }

    /// Drop any pending deadline, keeping the dirty flag.
    pub fn cancel_timer(self) -> SyncPhase {
        match self {
            SyncPhase::Dirty { .. } => SyncPhase::Dirty { save_due_at: None },
            other => other,
        }
    }

    pub fn begin_save(self) -> Result<SyncPhase, Busy> {
        match self {
            SyncPhase::Clean | SyncPhase::Dirty { .. } => Ok(SyncPhase::Saving),
            busy => Err(Busy(busy)),
        }
    }

    /// `local_edits` covers buffer changes the phase has not seen yet.
    pub fn open_conflict(self, local_edits: bool) -> Result<SyncPhase, Busy> {
        match self {
            SyncPhase::Clean => Ok(SyncPhase::Conflict { dirty: local_edits }),
            SyncPhase::Dirty { .. } | SyncPhase::Saving => Ok(SyncPhase::Conflict { dirty: true }),
            busy => Err(Busy(busy)),
        }
    }

    pub fn begin_switch(self) -> Result<SyncPhase, Busy> {
        match self {
            SyncPhase::Dirty { .. } => Ok(SyncPhase::Switching),
            busy => Err(Busy(busy)),
        }
    }

    /// Leave any phase, landing on the given dirty flag with no timer.
    pub fn settle(dirty: bool) -> SyncPhase {
        if dirty {
            SyncPhase::Dirty { save_due_at: None }
        } else {
            SyncPhase::Clean
        }
    }
}
