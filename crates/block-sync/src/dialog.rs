//! Decision provider for the two modal questions the manager asks.
//!
//! The Obsidian plugin answers these with modal dialogs, the daemon with a
//! terminal prompt, and tests with a scripted queue. A provider that fails
//! (dialog torn down, stdin closed) is treated as a cancel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DialogError {
    #[error("Dialog dismissed")]
    Dismissed,

    #[error("Dialog error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DialogError>;

/// Disk and buffer disagree and both have changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictPrompt {
    pub path: String,
    /// In-memory (editor) content.
    pub local: String,
    /// On-disk content.
    pub external: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictDecision {
    /// Local content wins; save again without the conflict check.
    Overwrite,
    /// Disk content wins; local edits are discarded.
    AcceptExternal,
    /// Local content goes to a timestamped copy, then disk content wins.
    KeepBoth,
    Cancel,
}

/// The manager is asked to bind another file while edits are unsaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchPrompt {
    pub current_path: String,
    pub new_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchDecision {
    SaveAndSwitch,
    DiscardAndSwitch,
    Cancel,
}

#[async_trait]
pub trait DecisionProvider: Send + Sync {
    async fn resolve_conflict(&self, prompt: &ConflictPrompt) -> Result<ConflictDecision>;

    async fn confirm_switch(&self, prompt: &SwitchPrompt) -> Result<SwitchDecision>;
}

/// Answers every question with "cancel". The safe default for hosts that
/// have no way to ask the user.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysCancel;

#[async_trait]
impl DecisionProvider for AlwaysCancel {
    async fn resolve_conflict(&self, _prompt: &ConflictPrompt) -> Result<ConflictDecision> {
        Ok(ConflictDecision::Cancel)
    }

    async fn confirm_switch(&self, _prompt: &SwitchPrompt) -> Result<SwitchDecision> {
        Ok(SwitchDecision::Cancel)
    }
}
