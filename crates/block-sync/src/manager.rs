//! BlockContentSyncManager: keeps an editor buffer and its file of record
//! consistent.
//!
//! The save path works as follows:
//!
//! 1. Read the file ("before"). A read failure aborts with the buffer dirty.
//! 2. Compare "before" with the last saved baseline. If someone else changed
//!    the file, ask the user how to resolve the conflict instead of writing.
//! 3. Ask the backup trigger policy whether this save deserves a safety copy
//!    and write it. Backup failures never block the save.
//! 4. Write the live content.
//! 5. Read it back. If what landed differs from what was written, restore
//!    "before" and leave the buffer dirty.
//! 6. On success both baselines become the verified read-back content.
//!
//! External change notifications run a parallel path: with no local edits the
//! new disk content is applied silently, otherwise the same conflict dialog
//! opens.
//!
//! All methods take `&mut self`, so at most one save, dialog or switch is in
//! flight per manager. Hosts queue editor and file events while an `await`
//! is pending.

use crate::backup::{BackupInput, BackupReason, BackupTriggerDetector, BackupWriter};
use crate::clock::{Clock, Millis, SystemClock};
use crate::dialog::{
    AlwaysCancel, ConflictDecision, ConflictPrompt, DecisionProvider, SwitchDecision, SwitchPrompt,
};
use crate::editor::{ContentEquivalence, EditorSurface, NormalizedEquivalence};
use crate::events::{EventBus, Notice, NoticeLevel, SyncEvent};
use crate::fs::{FileSystem, FsError};
use crate::naming;
use crate::settings::Settings;
use crate::state::{Busy, SyncMode, SyncPhase, SyncResult, SyncState};

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// How a save attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written and verified.
    Saved,
    /// Buffer and disk already match the baseline; nothing was written.
    UpToDate,
    /// No file is bound.
    Unbound,
    /// Another save, dialog or switch is in progress.
    Busy,
    /// The file changed on disk and there were no local edits; the disk
    /// content was applied.
    Rebased,
    /// A conflict was resolved without a save of the local content.
    Conflict(ConflictDecision),
    /// Could not read or write the file; nothing changed on disk.
    Failed,
    /// Written, but the read-back failed.
    Unverified,
    /// Read-back differed from what was written; previous content restored.
    RolledBack,
    /// Read-back differed and restoring the previous content failed too.
    RollbackFailed,
}

/// How an external change notification was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalOutcome {
    /// Not the bound file.
    Ignored,
    /// Disk still matches the saved baseline (usually our own write).
    Unchanged,
    /// Disk now holds exactly the buffer content; adopted as the baseline.
    Converged,
    /// No local edits; disk content applied to the editor.
    Applied,
    /// Local edits existed; the conflict dialog ran.
    Conflict(SaveOutcome),
    ReadFailed,
    Busy,
}

/// How a `load_file` request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// Same file is bound and has unsaved edits; nothing was reloaded.
    AlreadyBound,
    /// The user (or the cooldown) cancelled the switch.
    Cancelled,
    /// "Save and switch" was chosen but the save did not leave the buffer
    /// clean, so the switch was abandoned.
    SaveFailed(SaveOutcome),
    Busy,
}

#[derive(Debug, Clone, Copy, Default)]
struct PersistOptions {
    manual: bool,
    skip_conflict_check: bool,
}

impl PersistOptions {
    fn auto() -> Self {
        Self::default()
    }

    fn manual() -> Self {
        Self {
            manual: true,
            skip_conflict_check: false,
        }
    }
}

/// A cancelled switch, remembered to avoid re-prompting for the same pair.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SwitchCooldown {
    current_path: String,
    new_path: String,
    at: Millis,
}

pub struct BlockContentSyncManager<F: FileSystem, E: EditorSurface> {
    fs: F,
    editor: E,
    settings: Settings,
    clock: Arc<dyn Clock>,
    equivalence: Box<dyn ContentEquivalence>,
    decisions: Box<dyn DecisionProvider>,
    backups: Option<Box<dyn BackupWriter>>,
    events: Arc<EventBus>,
    detector: BackupTriggerDetector,

    phase: SyncPhase,
    current_path: Option<String>,
    /// Last content known to be on disk, verified.
    last_saved_markdown: String,
    /// Last content this manager pushed into the editor.
    last_applied_markdown: String,
    last_saved_at: Option<Millis>,
    last_sync_result: Option<SyncResult>,
    last_sync_message: Option<String>,
    switch_cooldown: Option<SwitchCooldown>,
}

impl<F: FileSystem, E: EditorSurface> BlockContentSyncManager<F, E> {
    /// Create a manager with the system clock, whitespace-tolerant content
    /// comparison, no backups and a decision provider that always cancels.
    pub fn new(fs: F, editor: E, settings: Settings) -> Self {
        let detector = BackupTriggerDetector::new(settings.trigger_config());
        Self {
            fs,
            editor,
            settings,
            clock: Arc::new(SystemClock),
            equivalence: Box::new(NormalizedEquivalence),
            decisions: Box::new(AlwaysCancel),
            backups: None,
            events: Arc::new(EventBus::new()),
            detector,
            phase: SyncPhase::Clean,
            current_path: None,
            last_saved_markdown: String::new(),
            last_applied_markdown: String::new(),
            last_saved_at: None,
            last_sync_result: None,
            last_sync_message: None,
            switch_cooldown: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_equivalence(mut self, equivalence: impl ContentEquivalence + 'static) -> Self {
        self.equivalence = Box::new(equivalence);
        self
    }

    pub fn with_decisions(mut self, decisions: impl DecisionProvider + 'static) -> Self {
        self.decisions = Box::new(decisions);
        self
    }

    pub fn with_backup_writer(mut self, writer: impl BackupWriter + 'static) -> Self {
        self.backups = Some(Box::new(writer));
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    // ========== Accessors ==========

    pub fn state(&self) -> SyncState {
        SyncState {
            mode: self.settings.sync_mode,
            dirty: self.phase.is_dirty(),
            saving: self.phase.is_saving(),
            last_saved_at: self.last_saved_at,
            current_file_path: self.current_path.clone(),
            last_sync_result: self.last_sync_result,
            last_sync_message: self.last_sync_message.clone(),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn is_dirty(&self) -> bool {
        self.phase.is_dirty()
    }

    pub fn current_path(&self) -> Option<&str> {
        self.current_path.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Mutable access for hosts that feed user edits into the surface.
    /// Call `handle_editor_update` afterwards.
    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn file_system(&self) -> &F {
        &self.fs
    }

    /// When the pending auto save is due, if any.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.phase.save_due_at()
    }

    // ========== Binding ==========

    /// Bind the manager to `path`, asking first if the current file has
    /// unsaved edits.
    ///
    /// Returns `Err` only when the new file cannot be read; the previous
    /// binding is left untouched in that case.
    pub async fn load_file(&mut self, path: &str) -> Result<LoadOutcome> {
        if self.phase.is_busy() {
            debug!(path = %path, phase = ?self.phase, "Ignoring load while busy");
            return Ok(LoadOutcome::Busy);
        }

        match self.current_path.clone() {
            Some(current) if current == path => {
                if self.phase.is_dirty() {
                    debug!(path = %path, "File already bound with unsaved edits");
                    return Ok(LoadOutcome::AlreadyBound);
                }
            }
            Some(current) if self.phase.is_dirty() => {
                match self.confirm_switch(&current, path).await {
                    SwitchDecision::Cancel => return Ok(LoadOutcome::Cancelled),
                    SwitchDecision::DiscardAndSwitch => {
                        info!(from = %current, to = %path, "Discarding unsaved edits");
                    }
                    SwitchDecision::SaveAndSwitch => {
                        let outcome = self.flush().await;
                        if self.phase.is_dirty() {
                            self.notify(Notice::warning(format!(
                                "Stayed on {}: its changes could not be saved",
                                current
                            )));
                            return Ok(LoadOutcome::SaveFailed(outcome));
                        }
                    }
                }
            }
            _ => {}
        }

        self.bind(path).await?;
        Ok(LoadOutcome::Loaded)
    }

    async fn bind(&mut self, path: &str) -> Result<()> {
        let text = self.fs.read(path).await?;
        let path_changed = self.current_path.as_deref() != Some(path);

        self.editor.set_markdown(&text);
        self.last_saved_markdown = text.clone();
        self.last_applied_markdown = text;
        self.current_path = Some(path.to_string());
        if path_changed {
            self.detector.reset_session(self.clock.now_millis());
            self.last_saved_at = None;
            self.last_sync_result = None;
            self.last_sync_message = None;
        }
        self.set_phase(SyncPhase::Clean);

        info!(path = %path, "Bound file");
        Ok(())
    }

    /// Ask whether to leave a file with unsaved edits, honoring the cooldown
    /// for a pair the user just declined.
    async fn confirm_switch(&mut self, current: &str, new_path: &str) -> SwitchDecision {
        let now = self.clock.now_millis();
        if let Some(cooldown) = &self.switch_cooldown {
            if cooldown.current_path == current
                && cooldown.new_path == new_path
                && now.saturating_sub(cooldown.at) < self.settings.switch_cooldown_ms
            {
                debug!(from = %current, to = %new_path, "Switch recently cancelled, not asking again");
                return SwitchDecision::Cancel;
            }
        }

        let resume = self.phase;
        match self.phase.begin_switch() {
            Ok(phase) => self.set_phase(phase),
            Err(Busy(phase)) => {
                debug!(phase = ?phase, "Cannot confirm switch");
                return SwitchDecision::Cancel;
            }
        }

        let prompt = SwitchPrompt {
            current_path: current.to_string(),
            new_path: new_path.to_string(),
        };
        let decision = match self.decisions.confirm_switch(&prompt).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(from = %current, to = %new_path, "Switch dialog failed: {}", e);
                SwitchDecision::Cancel
            }
        };
        self.set_phase(resume);

        if decision == SwitchDecision::Cancel {
            self.switch_cooldown = Some(SwitchCooldown {
                current_path: current.to_string(),
                new_path: new_path.to_string(),
                at: self.clock.now_millis(),
            });
            self.notify(Notice::info(format!(
                "Stayed on {}; unsaved changes kept",
                current
            )));
        } else {
            self.switch_cooldown = None;
        }
        decision
    }

    /// The bound file was renamed externally. Baselines are unaffected.
    pub fn handle_file_renamed(&mut self, old_path: &str, new_path: &str) {
        if self.current_path.as_deref() == Some(old_path) {
            info!(from = %old_path, to = %new_path, "Bound file renamed");
            self.current_path = Some(new_path.to_string());
            self.switch_cooldown = None;
            self.emit_state();
        }
    }

    /// Cancel the pending save and forget the binding without writing.
    pub fn dispose(&mut self) {
        if self.phase.is_dirty() {
            warn!(path = ?self.current_path, "Disposing with unsaved edits");
        }
        self.current_path = None;
        self.last_saved_markdown.clear();
        self.last_applied_markdown.clear();
        self.last_saved_at = None;
        self.last_sync_result = None;
        self.last_sync_message = None;
        self.switch_cooldown = None;
        self.set_phase(SyncPhase::Clean);
    }

    // ========== Local edits ==========

    /// The editor content changed.
    pub fn handle_editor_update(&mut self) {
        if self.current_path.is_none() || self.phase.is_busy() {
            return;
        }

        let live = self.editor.get_markdown();
        if self.matches_baseline(&live) {
            return;
        }

        let save_due_at = match self.settings.sync_mode {
            SyncMode::Auto => Some(
                self.clock
                    .now_millis()
                    .saturating_add(self.settings.debounce_ms),
            ),
            SyncMode::Manual => None,
        };
        self.set_phase(self.phase.edited(save_due_at));
    }

    /// Run the auto save if its debounce deadline has passed.
    pub async fn poll_timers(&mut self) -> Option<SaveOutcome> {
        let due = self.phase.save_due_at()?;
        if self.clock.now_millis() < due {
            return None;
        }
        self.set_phase(self.phase.cancel_timer());
        Some(self.persist_changes(PersistOptions::auto()).await)
    }

    /// Save now, whatever the mode.
    pub async fn trigger_manual_sync(&mut self) -> SaveOutcome {
        self.set_phase(self.phase.cancel_timer());
        self.persist_changes(PersistOptions::manual()).await
    }

    /// Cancel the pending timer and save once if there are unsaved edits.
    pub async fn flush(&mut self) -> SaveOutcome {
        self.set_phase(self.phase.cancel_timer());
        if !self.phase.is_dirty() {
            return SaveOutcome::UpToDate;
        }
        self.persist_changes(PersistOptions::auto()).await
    }

    pub fn update_settings(&mut self, settings: Settings) {
        self.detector.set_config(settings.trigger_config());
        self.settings = settings;

        self.phase = match (self.settings.sync_mode, self.phase) {
            (SyncMode::Manual, phase) => phase.cancel_timer(),
            (SyncMode::Auto, SyncPhase::Dirty { .. }) => SyncPhase::Dirty {
                save_due_at: Some(
                    self.clock
                        .now_millis()
                        .saturating_add(self.settings.debounce_ms),
                ),
            },
            (SyncMode::Auto, phase) => phase,
        };
        // Mode is part of the snapshot even when the phase is unchanged
        self.emit_state();
    }

    // ========== External changes ==========

    /// The file at `path` changed on disk.
    pub async fn handle_external_change(&mut self, path: &str) -> ExternalOutcome {
        if self.current_path.as_deref() != Some(path) {
            return ExternalOutcome::Ignored;
        }
        if self.phase.is_busy() {
            return ExternalOutcome::Busy;
        }

        let disk = match self.fs.read(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path, "Failed to read externally changed file: {}", e);
                return ExternalOutcome::ReadFailed;
            }
        };

        if self.equivalent(&disk, &self.last_saved_markdown) {
            debug!(path = %path, "External change matches saved baseline");
            return ExternalOutcome::Unchanged;
        }

        let live = self.editor.get_markdown();
        if !self.has_local_edits(&live) {
            debug!(path = %path, "Applying external change");
            self.apply_external(path, &disk);
            return ExternalOutcome::Applied;
        }

        if self.equivalent(&disk, &live) {
            debug!(path = %path, "Disk caught up with the buffer");
            self.last_saved_markdown = disk;
            self.set_phase(SyncPhase::Clean);
            return ExternalOutcome::Converged;
        }

        let outcome = self
            .resolve_conflict(path, live, disk, PersistOptions::auto())
            .await;
        ExternalOutcome::Conflict(outcome)
    }

    // ========== Save path ==========

    async fn persist_changes(&mut self, options: PersistOptions) -> SaveOutcome {
        let Some(path) = self.current_path.clone() else {
            if options.manual {
                self.notify(Notice::warning("No file is open"));
            }
            return SaveOutcome::Unbound;
        };

        let was_dirty = self.phase.is_dirty();
        match self.phase.begin_save() {
            Ok(phase) => self.set_phase(phase),
            Err(Busy(phase)) => {
                debug!(path = %path, phase = ?phase, "Save skipped, manager busy");
                return SaveOutcome::Busy;
            }
        }

        let live = self.editor.get_markdown();

        let before = match self.fs.read(&path).await {
            Ok(text) => text,
            Err(e) => {
                self.set_phase(SyncPhase::settle(was_dirty));
                self.fail(format!("Could not read {} before saving: {}", path, e));
                return SaveOutcome::Failed;
            }
        };

        let disk_matches_baseline = self.equivalent(&before, &self.last_saved_markdown);

        if !options.skip_conflict_check && !disk_matches_baseline {
            if was_dirty || !self.equivalent(&live, &self.last_applied_markdown) {
                return self.resolve_conflict(&path, live, before, options).await;
            }
            self.apply_external(&path, &before);
            self.notify(Notice::info(format!("Loaded external changes to {}", path)));
            return SaveOutcome::Rebased;
        }

        if disk_matches_baseline && self.equivalent(&live, &self.last_saved_markdown) {
            debug!(path = %path, "Nothing to save");
            if was_dirty {
                // A failed or unverified attempt is settled by this check
                self.last_saved_at = Some(self.clock.now_millis());
                self.last_sync_result = Some(SyncResult::Ok);
                self.last_sync_message = None;
            }
            self.set_phase(SyncPhase::Clean);
            if options.manual {
                self.notify(Notice::info(format!("{} is already up to date", path)));
            }
            return SaveOutcome::UpToDate;
        }

        self.write_backup_if_needed(&path, &before, &live, options.manual, was_dirty)
            .await;

        if let Err(e) = self.fs.write(&path, &live).await {
            self.set_phase(SyncPhase::settle(true));
            self.fail(format!("Could not save {}: {}", path, e));
            return SaveOutcome::Failed;
        }

        let read_back = match self.fs.read(&path).await {
            Ok(text) => text,
            Err(e) => {
                // The write probably landed; keep it as the baseline so the
                // next save does not see our own content as a conflict, but
                // stay dirty until a save is verified.
                self.last_saved_markdown = live.clone();
                self.last_applied_markdown = live;
                self.set_phase(SyncPhase::settle(true));
                self.fail(format!("Saved {} but could not verify it: {}", path, e));
                return SaveOutcome::Unverified;
            }
        };

        if !self.equivalent(&read_back, &live) {
            return self.roll_back(&path, before).await;
        }

        let now = self.clock.now_millis();
        self.last_saved_markdown = read_back.clone();
        self.last_applied_markdown = read_back;
        self.last_saved_at = Some(now);
        self.last_sync_result = Some(SyncResult::Ok);
        self.last_sync_message = None;
        self.set_phase(SyncPhase::Clean);
        self.notify(Notice::info(format!("Saved {}", path)));
        SaveOutcome::Saved
    }

    /// Restore `before` after a write that did not verify.
    async fn roll_back(&mut self, path: &str, before: String) -> SaveOutcome {
        error!(path = %path, "Read-back after write did not match, rolling back");

        let restored = self.fs.write(path, &before).await;
        self.last_saved_markdown = before;
        self.set_phase(SyncPhase::settle(true));

        match restored {
            Ok(()) => {
                self.fail(format!(
                    "Saving {} could not be verified; the previous content was restored",
                    path
                ));
                SaveOutcome::RolledBack
            }
            Err(e) => {
                self.fail(format!(
                    "Saving {} could not be verified and the previous content could not be \
                     restored ({}); recover it from a backup",
                    path, e
                ));
                SaveOutcome::RollbackFailed
            }
        }
    }

    async fn write_backup_if_needed(
        &mut self,
        path: &str,
        before: &str,
        after: &str,
        manual: bool,
        dirty: bool,
    ) {
        if !self.settings.enable_sync_backup {
            return;
        }
        let Some(writer) = &self.backups else {
            return;
        };

        let now = self.clock.now_millis();
        let input = BackupInput {
            before,
            after,
            manual,
            dirty,
        };
        let Some(reason) = self.detector.detect(&input, now) else {
            return;
        };

        match writer
            .write_sync_backup_pair(path, before, after, reason)
            .await
        {
            Ok(pair) => {
                debug!(path = %path, reason = %reason, backup = %pair.before_path, "Backup written");
                self.detector.record_backup(now);
                if reason == BackupReason::SessionStart {
                    self.detector.mark_session_start_backup_done();
                }
                self.events.emit(SyncEvent::BackupWritten {
                    path: path.to_string(),
                    reason,
                });
            }
            Err(e) => {
                self.notify(Notice::warning(format!(
                    "Backup of {} failed ({}); saving anyway",
                    path, e
                )));
            }
        }
    }

    // ========== Conflicts ==========

    async fn resolve_conflict(
        &mut self,
        path: &str,
        local: String,
        external: String,
        options: PersistOptions,
    ) -> SaveOutcome {
        let local_edits = self.has_local_edits(&local);
        let dirty = match self.phase.open_conflict(local_edits) {
            Ok(phase) => {
                self.set_phase(phase);
                phase.is_dirty()
            }
            Err(Busy(phase)) => {
                debug!(path = %path, phase = ?phase, "Conflict dialog already open");
                return SaveOutcome::Busy;
            }
        };

        info!(path = %path, "File changed on disk while there are unsaved edits");
        let prompt = ConflictPrompt {
            path: path.to_string(),
            local,
            external,
        };
        let decision = match self.decisions.resolve_conflict(&prompt).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(path = %path, "Conflict dialog failed: {}", e);
                ConflictDecision::Cancel
            }
        };
        self.set_phase(SyncPhase::settle(dirty));

        match decision {
            ConflictDecision::Overwrite => {
                let options = PersistOptions {
                    skip_conflict_check: true,
                    ..options
                };
                Box::pin(self.persist_changes(options)).await
            }
            ConflictDecision::AcceptExternal => {
                self.apply_external(path, &prompt.external);
                self.notify(Notice::info(format!("Loaded the version of {} on disk", path)));
                SaveOutcome::Conflict(decision)
            }
            ConflictDecision::KeepBoth => {
                let now = self.clock.now_millis();
                match naming::create_conflict_copy(&self.fs, path, &prompt.local, now).await {
                    Ok(copy) => {
                        self.events.emit(SyncEvent::ConflictCopyCreated { path: copy.clone() });
                        self.apply_external(path, &prompt.external);
                        self.notify(Notice::info(format!(
                            "Your version was saved as {}; {} now shows the version on disk",
                            copy, path
                        )));
                        SaveOutcome::Conflict(decision)
                    }
                    Err(e) => {
                        // Without the copy the local content must stay in the editor
                        self.fail(format!("Could not save a copy of {}: {}", path, e));
                        SaveOutcome::Failed
                    }
                }
            }
            ConflictDecision::Cancel => {
                self.notify(Notice::warning(format!(
                    "Conflict in {} left unresolved; nothing was saved",
                    path
                )));
                SaveOutcome::Conflict(decision)
            }
        }
    }

    /// Push disk content into the editor and adopt it as both baselines.
    fn apply_external(&mut self, path: &str, text: &str) {
        self.editor.set_markdown(text);
        self.last_saved_markdown = text.to_string();
        self.last_applied_markdown = text.to_string();
        self.set_phase(SyncPhase::Clean);
        self.events.emit(SyncEvent::ExternalApplied {
            path: path.to_string(),
        });
    }

    // ========== Helpers ==========

    fn equivalent(&self, a: &str, b: &str) -> bool {
        self.equivalence.equivalent(a, b)
    }

    fn matches_baseline(&self, live: &str) -> bool {
        self.equivalent(live, &self.last_saved_markdown)
            || self.equivalent(live, &self.last_applied_markdown)
    }

    fn has_local_edits(&self, live: &str) -> bool {
        self.phase.is_dirty() || !self.equivalent(live, &self.last_applied_markdown)
    }

    fn set_phase(&mut self, phase: SyncPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.emit_state();
        }
    }

    fn emit_state(&self) {
        self.events.emit(SyncEvent::StateChanged {
            state: self.state(),
        });
    }

    /// Record a failed attempt and tell the user.
    fn fail(&mut self, message: String) {
        self.last_sync_result = Some(SyncResult::Error);
        self.last_sync_message = Some(message.clone());
        self.emit_state();
        self.notify(Notice::error(message));
    }

    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!("{}", notice.message),
            NoticeLevel::Warning => warn!("{}", notice.message),
            NoticeLevel::Error => error!("{}", notice.message),
        }
        self.events.emit(SyncEvent::Notice { notice });
    }
}
