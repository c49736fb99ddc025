//! The daemon's side of the sync manager: routes watcher events, timer ticks
//! and typed commands into one `BlockContentSyncManager`.

use crate::command::{Command, HELP};
use crate::draft::{DraftSurface, EchoTracker};
use crate::native_fs::NativeFs;
use crate::watcher::{FileEvent, FileEventKind};
use anyhow::{Context, Result};
use block_sync::{
    BlockContentSyncManager, Clock, DecisionProvider, NoticeLevel, SaveOutcome, Settings,
    Subscription, SyncEvent, SystemClock, VaultBackupWriter,
};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub type DaemonManager = BlockContentSyncManager<NativeFs, DraftSurface>;

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub vault: PathBuf,
    pub draft: PathBuf,
    pub settings: Settings,
}

pub struct Host {
    manager: DaemonManager,
    echoes: EchoTracker,
    clock: Arc<dyn Clock>,
    _subscription: Subscription,
}

impl Host {
    pub fn new(config: HostConfig, decisions: impl DecisionProvider + 'static) -> Result<Self> {
        let fs = NativeFs::new(config.vault);
        let echoes = EchoTracker::new();
        let draft = DraftSurface::open(config.draft.clone(), echoes.clone())
            .with_context(|| format!("Failed to open draft {}", config.draft.display()))?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let backups =
            VaultBackupWriter::new(fs.clone(), Arc::clone(&clock), config.settings.backup_retention);

        let manager = BlockContentSyncManager::new(fs, draft, config.settings)
            .with_clock(Arc::clone(&clock))
            .with_decisions(decisions)
            .with_backup_writer(backups);

        // Notices go to stdout next to the prompts; logs go to stderr
        let subscription = manager.events().subscribe(|event| match event {
            SyncEvent::Notice { notice } => {
                let tag = match notice.level {
                    NoticeLevel::Info => "info",
                    NoticeLevel::Warning => "warning",
                    NoticeLevel::Error => "error",
                };
                println!("[{}] {}", tag, notice.message);
            }
            SyncEvent::BackupWritten { path, reason } => {
                info!(path = %path, reason = %reason, "Backup written");
            }
            SyncEvent::StateChanged { state } => {
                debug!(dirty = state.dirty, saving = state.saving, "Sync state changed");
            }
            _ => {}
        });

        Ok(Self {
            manager,
            echoes,
            clock,
            _subscription: subscription,
        })
    }

    pub fn manager(&self) -> &DaemonManager {
        &self.manager
    }

    /// Bind the first note.
    pub async fn start(&mut self, file: &str) -> Result<()> {
        self.manager
            .load_file(file)
            .await
            .with_context(|| format!("Failed to open {}", file))?;
        Ok(())
    }

    /// Time until the pending auto save is due.
    pub fn until_due(&self) -> Option<Duration> {
        self.manager
            .next_deadline()
            .map(|due| Duration::from_millis(due.saturating_sub(self.clock.now_millis())))
    }

    pub async fn on_timer(&mut self) {
        if let Some(outcome) = self.manager.poll_timers().await {
            debug!(outcome = ?outcome, "Auto save finished");
        }
        self.echoes.cleanup_expired();
    }

    /// The draft changed on disk: either the user edited it or it is the
    /// echo of our own write.
    pub fn on_draft_event(&mut self, event: &FileEvent) {
        if event.kind == FileEventKind::Deleted {
            warn!(draft = %event.path, "Draft deleted; it is recreated on the next applied change");
            return;
        }
        if self.echoes.consume(&event.path) {
            debug!(draft = %event.path, "Skipping draft event (own write)");
            return;
        }

        match self.manager.editor_mut().reload() {
            Ok(true) => self.manager.handle_editor_update(),
            Ok(false) => {}
            Err(e) => warn!(draft = %event.path, "Failed to read draft: {}", e),
        }
    }

    /// A note in the vault changed.
    pub async fn on_vault_event(&mut self, event: &FileEvent) {
        match event.kind {
            FileEventKind::Modified => {
                let outcome = self.manager.handle_external_change(&event.path).await;
                debug!(path = %event.path, outcome = ?outcome, "External change handled");
            }
            FileEventKind::Deleted => {
                if self.manager.current_path() == Some(event.path.as_str()) {
                    warn!(path = %event.path, "Bound note was deleted; the draft keeps its content");
                }
            }
        }
    }

    pub async fn on_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Sync => {
                let outcome = self.manager.trigger_manual_sync().await;
                debug!(outcome = ?outcome, "Manual sync finished");
            }
            Command::Open(path) => match self.manager.load_file(&path).await {
                Ok(outcome) => debug!(path = %path, outcome = ?outcome, "Open finished"),
                Err(e) => println!("[error] Could not open {}: {}", path, e),
            },
            Command::Mode(mode) => {
                let settings = Settings {
                    sync_mode: mode,
                    ..self.manager.settings().clone()
                };
                self.manager.update_settings(settings);
                println!("Sync mode: {}", mode);
            }
            Command::Status => match serde_json::to_string_pretty(&self.manager.state()) {
                Ok(json) => println!("{}", json),
                Err(e) => warn!("Failed to serialize state: {}", e),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Save pending edits once and release the note.
    pub async fn shutdown(&mut self) -> SaveOutcome {
        let outcome = self.manager.flush().await;
        if self.manager.is_dirty() {
            warn!(outcome = ?outcome, "Exiting with unsaved edits; they remain in the draft");
        }
        self.manager.dispose();
        outcome
    }
}
