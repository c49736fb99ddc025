//! Backup pair storage.
//!
//! `VaultBackupWriter` keeps backups inside the vault's `.sync` directory,
//! mirroring the note's folder structure:
//!
//! ```text
//! .sync/backups/daily/Note/20240101-093000-big-paste.before.md
//! .sync/backups/daily/Note/20240101-093000-big-paste.after.md
//! ```

use super::trigger::BackupReason;
use crate::clock::{Clock, Millis};
use crate::fs::{FileSystem, FsError};
use crate::naming::{self, PathParts};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Root of all backup pairs
pub const BACKUP_DIR: &str = ".sync/backups";

const BEFORE_SUFFIX: &str = ".before.md";
const AFTER_SUFFIX: &str = ".after.md";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),

    #[error("Backup error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BackupError>;

/// Where a backup pair landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPair {
    pub before_path: String,
    pub after_path: String,
}

/// Durably stores the content on both sides of an overwrite.
#[async_trait]
pub trait BackupWriter: Send + Sync {
    async fn write_sync_backup_pair(
        &self,
        path: &str,
        before: &str,
        after: &str,
        reason: BackupReason,
    ) -> Result<BackupPair>;
}

#[async_trait]
impl<T: BackupWriter + ?Sized> BackupWriter for Arc<T> {
    async fn write_sync_backup_pair(
        &self,
        path: &str,
        before: &str,
        after: &str,
        reason: BackupReason,
    ) -> Result<BackupPair> {
        (**self)
            .write_sync_backup_pair(path, before, after, reason)
            .await
    }
}

/// Writes backup pairs through a `FileSystem`, keeping at most `retention`
/// pairs per note.
pub struct VaultBackupWriter<F: FileSystem> {
    fs: F,
    clock: Arc<dyn Clock>,
    /// Pairs kept per note; 0 keeps everything.
    retention: usize,
}

impl<F: FileSystem> VaultBackupWriter<F> {
    pub fn new(fs: F, clock: Arc<dyn Clock>, retention: usize) -> Self {
        Self {
            fs,
            clock,
            retention,
        }
    }

    /// Backup folder for a note: `.sync/backups/<dir>/<stem>`.
    pub fn backup_dir_for(path: &str) -> String {
        let parts = PathParts::parse(path);
        if parts.dir.is_empty() {
            format!("{}/{}", BACKUP_DIR, parts.stem)
        } else {
            format!("{}/{}/{}", BACKUP_DIR, parts.dir, parts.stem)
        }
    }

    /// Pair base name. `attempt` counts pairs within one second across all
    /// reasons, so `(stamp, attempt)` orders pairs by age.
    fn pair_base(stamp: &str, reason: BackupReason, attempt: u32) -> String {
        if attempt == 0 {
            format!("{}-{}", stamp, reason)
        } else {
            format!("{}-{}-{}", stamp, reason, attempt + 1)
        }
    }

    /// Age key of a pair base: its timestamp, then its attempt counter.
    fn pair_key(base: &str) -> (&str, u32) {
        let stamp_len = "YYYYMMDD-HHMMSS".len();
        let stamp = base.get(..stamp_len).unwrap_or(base);
        let attempt = base
            .rsplit_once('-')
            .and_then(|(_, tail)| tail.parse::<u32>().ok())
            .map_or(0, |n| n.saturating_sub(1));
        (stamp, attempt)
    }

    async fn pair_bases(&self, dir: &str) -> Result<Vec<String>> {
        Ok(self
            .fs
            .list(dir)
            .await?
            .into_iter()
            .filter(|entry| !entry.is_dir)
            .filter_map(|entry| entry.name.strip_suffix(BEFORE_SUFFIX).map(str::to_string))
            .collect())
    }

    /// First attempt counter not yet used by any pair in `stamp`.
    async fn next_attempt(&self, dir: &str, stamp: &str) -> Result<u32> {
        let next = self
            .pair_bases(dir)
            .await?
            .iter()
            .map(|base| Self::pair_key(base))
            .filter(|(s, _)| *s == stamp)
            .map(|(_, attempt)| attempt + 1)
            .max()
            .unwrap_or(0);
        Ok(next)
    }

    /// Delete the oldest pairs beyond the retention limit.
    async fn prune(&self, dir: &str) -> Result<()> {
        if self.retention == 0 {
            return Ok(());
        }

        let mut bases = self.pair_bases(dir).await?;
        if bases.len() <= self.retention {
            return Ok(());
        }

        bases.sort_by(|a, b| Self::pair_key(a).cmp(&Self::pair_key(b)));
        let excess = bases.len() - self.retention;
        for base in bases.into_iter().take(excess) {
            debug!(dir = %dir, pair = %base, "Pruning old backup pair");
            self.fs.delete(&format!("{}/{}{}", dir, base, BEFORE_SUFFIX)).await?;
            match self.fs.delete(&format!("{}/{}{}", dir, base, AFTER_SUFFIX)).await {
                Ok(()) | Err(FsError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn now(&self) -> Millis {
        self.clock.now_millis()
    }
}

#[async_trait]
impl<F: FileSystem> BackupWriter for VaultBackupWriter<F> {
    async fn write_sync_backup_pair(
        &self,
        path: &str,
        before: &str,
        after: &str,
        reason: BackupReason,
    ) -> Result<BackupPair> {
        let dir = Self::backup_dir_for(path);
        self.fs.mkdir(&dir).await?;

        let stamp = naming::format_timestamp(self.now());
        let first = self.next_attempt(&dir, &stamp).await?;
        let before_path = naming::create_unique(&self.fs, before, |attempt| {
            let attempt = first + attempt;
            format!("{}/{}{}", dir, Self::pair_base(&stamp, reason, attempt), BEFORE_SUFFIX)
        })
        .await?;

        let base = before_path
            .strip_suffix(BEFORE_SUFFIX)
            .ok_or_else(|| BackupError::Other(format!("Unexpected backup path: {}", before_path)))?;
        let after_path = format!("{}{}", base, AFTER_SUFFIX);
        self.fs.write(&after_path, after).await?;

        debug!(path = %path, reason = %reason, backup = %before_path, "Wrote backup pair");

        if let Err(e) = self.prune(&dir).await {
            warn!(path = %path, "Failed to prune old backups: {}", e);
        }

        Ok(BackupPair {
            before_path,
            after_path,
        })
    }
}
