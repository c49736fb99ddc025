//! Backup trigger policy.
//!
//! Rules are checked in a fixed priority order and the first match wins:
//!
//! 1. `manual-sync` - the user asked for this save
//! 2. `session-start` - first backup since the file was bound
//! 3. `risky-change` - new rich annotations (ruby, styled spans) appeared
//! 4. `big-paste` - content grew by many characters or lines at once
//! 5. `auto-interval` - unsaved edits and no backup for a while
//!
//! The detector only decides. Callers report a successful backup through
//! `record_backup` / `mark_session_start_backup_done` *after* the write, so a
//! failed backup is retried on the next save.

use crate::clock::Millis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a backup is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupReason {
    ManualSync,
    SessionStart,
    RiskyChange,
    BigPaste,
    AutoInterval,
}

impl BackupReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupReason::ManualSync => "manual-sync",
            BackupReason::SessionStart => "session-start",
            BackupReason::RiskyChange => "risky-change",
            BackupReason::BigPaste => "big-paste",
            BackupReason::AutoInterval => "auto-interval",
        }
    }
}

impl fmt::Display for BackupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds for the content-based rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerConfig {
    /// Character growth that counts as a big paste.
    pub big_paste_chars: usize,
    /// Newline growth that counts as a big paste.
    pub big_paste_newlines: usize,
    /// Minimum time between interval backups.
    pub auto_interval_ms: Millis,
    /// Opening-tag prefixes whose count increase marks a risky change.
    /// Matched case-insensitively.
    pub risky_markers: Vec<String>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            big_paste_chars: 200,
            big_paste_newlines: 2,
            auto_interval_ms: 20 * 60 * 1000,
            risky_markers: vec!["<ruby".to_string(), "<span".to_string()],
        }
    }
}

/// What is about to be saved.
#[derive(Debug, Clone, Copy)]
pub struct BackupInput<'a> {
    /// Current disk content.
    pub before: &'a str,
    /// Content about to be written.
    pub after: &'a str,
    /// The user explicitly requested this save.
    pub manual: bool,
    /// The buffer has unsaved edits.
    pub dirty: bool,
}

#[derive(Debug, Clone)]
pub struct BackupTriggerDetector {
    config: TriggerConfig,
    session_started_at: Option<Millis>,
    session_start_done: bool,
    last_backup_at: Option<Millis>,
}

impl BackupTriggerDetector {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            session_started_at: None,
            session_start_done: false,
            last_backup_at: None,
        }
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TriggerConfig) {
        self.config = config;
    }

    /// Start a new session for a freshly bound file.
    ///
    /// The next save becomes eligible for a `session-start` backup again.
    pub fn reset_session(&mut self, now: Millis) {
        self.session_started_at = Some(now);
        self.session_start_done = false;
        self.last_backup_at = None;
    }

    pub fn session_started_at(&self) -> Option<Millis> {
        self.session_started_at
    }

    pub fn last_backup_at(&self) -> Option<Millis> {
        self.last_backup_at
    }

    /// Pick the backup reason for a save, if any.
    pub fn detect(&self, input: &BackupInput<'_>, now: Millis) -> Option<BackupReason> {
        if input.manual {
            return Some(BackupReason::ManualSync);
        }
        if !self.session_start_done {
            return Some(BackupReason::SessionStart);
        }
        if self.is_risky(input.before, input.after) {
            return Some(BackupReason::RiskyChange);
        }
        if self.is_big_paste(input.before, input.after) {
            return Some(BackupReason::BigPaste);
        }
        if input.dirty && self.interval_elapsed(now) {
            return Some(BackupReason::AutoInterval);
        }
        None
    }

    /// Call after a backup was durably written.
    pub fn record_backup(&mut self, now: Millis) {
        self.last_backup_at = Some(now);
    }

    /// Call after the session-start backup was durably written.
    pub fn mark_session_start_backup_done(&mut self) {
        self.session_start_done = true;
    }

    fn is_risky(&self, before: &str, after: &str) -> bool {
        let before = before.to_ascii_lowercase();
        let after = after.to_ascii_lowercase();
        self.config.risky_markers.iter().any(|marker| {
            let marker = marker.to_ascii_lowercase();
            after.matches(marker.as_str()).count() > before.matches(marker.as_str()).count()
        })
    }

    fn is_big_paste(&self, before: &str, after: &str) -> bool {
        let char_growth = after.chars().count().saturating_sub(before.chars().count());
        let newline_growth = count_newlines(after).saturating_sub(count_newlines(before));
        char_growth >= self.config.big_paste_chars
            || newline_growth >= self.config.big_paste_newlines
    }

    fn interval_elapsed(&self, now: Millis) -> bool {
        match self.last_backup_at {
            Some(last) => now.saturating_sub(last) >= self.config.auto_interval_ms,
            None => true,
        }
    }
}

impl Default for BackupTriggerDetector {
    fn default() -> Self {
        Self::new(TriggerConfig::default())
    }
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}
