//! Shared test doubles for sync manager integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use block_sync::backup::{BackupError, BackupPair};
use block_sync::dialog::{self, ConflictPrompt, DialogError, SwitchPrompt};
use block_sync::fs::{self, FileEntry};
use block_sync::{
    BackupReason, BackupWriter, BlockContentSyncManager, Clock, ConflictDecision,
    DecisionProvider, FileSystem, FsError, InMemoryFs, ManualClock, MemoryEditor, Millis, Notice,
    Settings, Subscription, SwitchDecision, SyncEvent,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// File store with fault injection
// ============================================================================

/// What the next `write` call does.
#[derive(Debug, Clone)]
pub enum WriteFault {
    Fail,
    /// Write succeeds, then another writer immediately replaces the content.
    Race(String),
}

/// Wraps `InMemoryFs`, failing or racing operations on demand and logging
/// every successful write.
#[derive(Default)]
pub struct FaultyFs {
    inner: InMemoryFs,
    read_failures: Mutex<VecDeque<bool>>,
    write_faults: Mutex<VecDeque<Option<WriteFault>>>,
    fail_creates: AtomicBool,
    writes: Mutex<Vec<(String, String)>>,
}

impl FaultyFs {
    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            inner: InMemoryFs::with_files(files),
            ..Self::default()
        }
    }

    /// Replace a file as another program would.
    pub fn external_write(&self, path: &str, content: &str) {
        self.inner.insert(path, content);
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.inner.get(path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.inner.paths()
    }

    /// Script upcoming reads: `true` fails that read, `false` lets it pass.
    pub fn script_reads(&self, script: impl IntoIterator<Item = bool>) {
        self.read_failures.lock().unwrap().extend(script);
    }

    /// Script upcoming writes: `None` lets that write pass.
    pub fn script_writes(&self, script: impl IntoIterator<Item = Option<WriteFault>>) {
        self.write_faults.lock().unwrap().extend(script);
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Successful writes to `path`, in order.
    pub fn writes_to(&self, path: &str) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, content)| content.clone())
            .collect()
    }
}

#[async_trait]
impl FileSystem for FaultyFs {
    async fn read(&self, path: &str) -> fs::Result<String> {
        let fail = self.read_failures.lock().unwrap().pop_front().unwrap_or(false);
        if fail {
            return Err(FsError::Io(format!("injected read failure: {}", path)));
        }
        self.inner.read(path).await
    }

    async fn write(&self, path: &str, content: &str) -> fs::Result<()> {
        let fault = self.write_faults.lock().unwrap().pop_front().flatten();
        match fault {
            Some(WriteFault::Fail) => Err(FsError::Io(format!("injected write failure: {}", path))),
            Some(WriteFault::Race(other)) => {
                self.inner.write(path, content).await?;
                self.writes
                    .lock()
                    .unwrap()
                    .push((path.to_string(), content.to_string()));
                self.inner.insert(path, &other);
                Ok(())
            }
            None => {
                self.inner.write(path, content).await?;
                self.writes
                    .lock()
                    .unwrap()
                    .push((path.to_string(), content.to_string()));
                Ok(())
            }
        }
    }

    async fn create(&self, path: &str, content: &str) -> fs::Result<()> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(FsError::Io(format!("injected create failure: {}", path)));
        }
        self.inner.create(path, content).await
    }

    async fn list(&self, path: &str) -> fs::Result<Vec<FileEntry>> {
        self.inner.list(path).await
    }

    async fn delete(&self, path: &str) -> fs::Result<()> {
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &str) -> fs::Result<bool> {
        self.inner.exists(path).await
    }

    async fn mkdir(&self, path: &str) -> fs::Result<()> {
        self.inner.mkdir(path).await
    }
}

// ============================================================================
// Scripted dialogs
// ============================================================================

#[derive(Default)]
struct DecisionState {
    conflicts: VecDeque<ConflictDecision>,
    switches: VecDeque<SwitchDecision>,
    conflict_prompts: Vec<ConflictPrompt>,
    switch_prompts: Vec<SwitchPrompt>,
}

/// Answers dialogs from queues. An empty queue behaves like a dismissed
/// dialog.
#[derive(Clone, Default)]
pub struct ScriptedDecisions {
    state: Arc<Mutex<DecisionState>>,
}

impl ScriptedDecisions {
    pub fn push_conflict(&self, decision: ConflictDecision) {
        self.state.lock().unwrap().conflicts.push_back(decision);
    }

    pub fn push_switch(&self, decision: SwitchDecision) {
        self.state.lock().unwrap().switches.push_back(decision);
    }

    pub fn conflict_prompts(&self) -> Vec<ConflictPrompt> {
        self.state.lock().unwrap().conflict_prompts.clone()
    }

    pub fn switch_prompts(&self) -> Vec<SwitchPrompt> {
        self.state.lock().unwrap().switch_prompts.clone()
    }
}

#[async_trait]
impl DecisionProvider for ScriptedDecisions {
    async fn resolve_conflict(&self, prompt: &ConflictPrompt) -> dialog::Result<ConflictDecision> {
        let mut state = self.state.lock().unwrap();
        state.conflict_prompts.push(prompt.clone());
        state.conflicts.pop_front().ok_or(DialogError::Dismissed)
    }

    async fn confirm_switch(&self, prompt: &SwitchPrompt) -> dialog::Result<SwitchDecision> {
        let mut state = self.state.lock().unwrap();
        state.switch_prompts.push(prompt.clone());
        state.switches.pop_front().ok_or(DialogError::Dismissed)
    }
}

// ============================================================================
// Backup writer that records pairs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBackup {
    pub path: String,
    pub before: String,
    pub after: String,
    pub reason: BackupReason,
}

#[derive(Clone, Default)]
pub struct RecordingBackups {
    pairs: Arc<Mutex<Vec<RecordedBackup>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingBackups {
    pub fn reasons(&self) -> Vec<BackupReason> {
        self.pairs.lock().unwrap().iter().map(|b| b.reason).collect()
    }

    pub fn pairs(&self) -> Vec<RecordedBackup> {
        self.pairs.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BackupWriter for RecordingBackups {
    async fn write_sync_backup_pair(
        &self,
        path: &str,
        before: &str,
        after: &str,
        reason: BackupReason,
    ) -> Result<BackupPair, BackupError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BackupError::Other("disk full".to_string()));
        }
        self.pairs.lock().unwrap().push(RecordedBackup {
            path: path.to_string(),
            before: before.to_string(),
            after: after.to_string(),
            reason,
        });
        Ok(BackupPair {
            before_path: format!("backups/{}.before", path),
            after_path: format!("backups/{}.after", path),
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

pub type TestManager = BlockContentSyncManager<Arc<FaultyFs>, MemoryEditor>;

pub struct Harness {
    pub manager: TestManager,
    pub fs: Arc<FaultyFs>,
    pub clock: ManualClock,
    pub decisions: ScriptedDecisions,
    pub backups: RecordingBackups,
    notices: Arc<Mutex<Vec<Notice>>>,
    events: Arc<Mutex<Vec<SyncEvent>>>,
    _subscription: Subscription,
}

impl Harness {
    pub fn new<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::with_settings(files, Settings::default())
    }

    pub fn with_settings<'a>(
        files: impl IntoIterator<Item = (&'a str, &'a str)>,
        settings: Settings,
    ) -> Self {
        let fs = Arc::new(FaultyFs::with_files(files));
        let clock = ManualClock::default();
        let decisions = ScriptedDecisions::default();
        let backups = RecordingBackups::default();

        let manager = BlockContentSyncManager::new(Arc::clone(&fs), MemoryEditor::default(), settings)
            .with_clock(Arc::new(clock.clone()))
            .with_decisions(decisions.clone())
            .with_backup_writer(backups.clone());

        let notices = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let notices_clone = Arc::clone(&notices);
        let events_clone = Arc::clone(&events);
        let subscription = manager.events().subscribe(move |event| {
            if let SyncEvent::Notice { notice } = &event {
                notices_clone.lock().unwrap().push(notice.clone());
            }
            events_clone.lock().unwrap().push(event);
        });

        Self {
            manager,
            fs,
            clock,
            decisions,
            backups,
            notices,
            events,
            _subscription: subscription,
        }
    }

    /// Harness with `Note.md` containing `content`, already bound.
    pub async fn bound(content: &str) -> Self {
        let mut harness = Self::new([("Note.md", content)]);
        harness.manager.load_file("Note.md").await.unwrap();
        harness.take_notices();
        harness
    }

    /// Simulate the user typing `text` into the editor.
    pub fn type_text(&mut self, text: &str) {
        self.manager.editor_mut().type_text(text);
        self.manager.handle_editor_update();
    }

    pub fn now(&self) -> Millis {
        self.clock.now_millis()
    }

    pub fn editor_text(&self) -> String {
        self.manager.editor().text().to_string()
    }

    /// Drain the notices emitted so far.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap())
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }
}
