//! User settings for the sync manager.
//!
//! Stored as JSON alongside the plugin data (camelCase keys). Every field has
//! a default, so partial or older settings files still load.

use crate::backup::TriggerConfig;
use crate::clock::Millis;
use crate::state::SyncMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub sync_mode: SyncMode,
    pub enable_sync_backup: bool,
    /// Quiet period after the last edit before an auto save.
    pub debounce_ms: Millis,
    pub backup_interval_minutes: u64,
    pub big_paste_chars: usize,
    pub big_paste_newlines: usize,
    /// How long a cancelled file switch suppresses the same prompt.
    pub switch_cooldown_ms: Millis,
    /// Backup pairs kept per note (0 = unlimited).
    pub backup_retention: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::Auto,
            enable_sync_backup: true,
            debounce_ms: 500,
            backup_interval_minutes: 20,
            big_paste_chars: 200,
            big_paste_newlines: 2,
            switch_cooldown_ms: 2000,
            backup_retention: 20,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        if self.big_paste_chars == 0 {
            return Err(SettingsError::Invalid {
                field: "bigPasteChars",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.big_paste_newlines == 0 {
            return Err(SettingsError::Invalid {
                field: "bigPasteNewlines",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn backup_interval_ms(&self) -> Millis {
        self.backup_interval_minutes.saturating_mul(60 * 1000)
    }

    /// Thresholds for the backup trigger detector.
    pub fn trigger_config(&self) -> TriggerConfig {
        TriggerConfig {
            big_paste_chars: self.big_paste_chars,
            big_paste_newlines: self.big_paste_newlines,
            auto_interval_ms: self.backup_interval_ms(),
            ..TriggerConfig::default()
        }
    }
}
