//! Draft file acting as the editor surface.
//!
//! The user edits the draft with any editor; the daemon reloads it on watcher
//! events and hands the text to the sync manager. When the manager applies
//! disk content, the draft is rewritten and the write is marked in an
//! `EchoTracker` so the watcher event it causes is not taken for an edit.

use block_sync::EditorSurface;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Time-to-live for echo flags. Flags older than this are considered stale.
const FLAG_TTL: Duration = Duration::from_secs(5);

/// Tracks files the daemon itself just wrote.
///
/// Mark a path *before* writing it; the watcher consumes the flag when the
/// event arrives. Flags expire after `FLAG_TTL` so a dropped watcher event
/// cannot suppress a later real edit.
#[derive(Clone, Default)]
pub struct EchoTracker {
    written: Arc<Mutex<HashMap<String, Instant>>>,
}

impl EchoTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_written(&self, path: &str) {
        if let Ok(mut written) = self.written.lock() {
            written.insert(path.to_string(), Instant::now());
        }
    }

    /// Check if `path` was written by us and consume the flag (returns true
    /// once). Expired flags count as absent.
    pub fn consume(&self, path: &str) -> bool {
        let Ok(mut written) = self.written.lock() else {
            return false;
        };
        written
            .remove(path)
            .is_some_and(|at| at.elapsed() < FLAG_TTL)
    }

    /// Drop expired flags.
    pub fn cleanup_expired(&self) {
        if let Ok(mut written) = self.written.lock() {
            written.retain(|_, at| at.elapsed() < FLAG_TTL);
        }
    }
}

pub struct DraftSurface {
    path: PathBuf,
    /// Key under which our writes are tracked (the draft's file name).
    key: String,
    text: String,
    echoes: EchoTracker,
}

impl DraftSurface {
    /// Open (or create) the draft at `path`.
    pub fn open(path: PathBuf, echoes: EchoTracker) -> std::io::Result<Self> {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };
        let key = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self {
            path,
            key,
            text,
            echoes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Watcher key for this draft.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Re-read the draft after a watcher event. Returns whether the text
    /// changed.
    pub fn reload(&mut self) -> std::io::Result<bool> {
        let text = std::fs::read_to_string(&self.path)?;
        if text == self.text {
            return Ok(false);
        }
        self.text = text;
        Ok(true)
    }
}

impl EditorSurface for DraftSurface {
    fn get_markdown(&self) -> String {
        self.text.clone()
    }

    fn set_markdown(&mut self, text: &str) {
        self.text = text.to_string();
        self.echoes.mark_written(&self.key);
        match std::fs::write(&self.path, text) {
            Ok(()) => debug!(draft = %self.path.display(), "Draft updated"),
            Err(e) => {
                // The in-memory text is still authoritative for the manager
                error!(draft = %self.path.display(), "Failed to write draft: {}", e);
            }
        }
    }
}
