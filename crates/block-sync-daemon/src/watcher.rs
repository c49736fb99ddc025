//! File watchers for the vault and the draft file.
//!
//! Uses notify-debouncer-mini for efficient file change detection.

use anyhow::{Result, anyhow};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEvent, new_debouncer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// File event from the watcher.
#[derive(Debug, Clone)]
pub struct FileEvent {
    /// Path relative to the watched root
    pub path: String,
    pub kind: FileEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// File was created or modified
    Modified,
    Deleted,
}

/// What a watcher reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchScope {
    /// Every visible markdown note under the root, skipping `.sync`.
    Notes,
    /// A single file directly inside the root.
    File(String),
}

impl WatchScope {
    fn accepts(&self, relative: &str) -> bool {
        match self {
            WatchScope::Notes => {
                // Hidden entries include .sync (backups) and editor swap files
                !(relative.starts_with('.') || relative.contains("/."))
                    && relative.ends_with(".md")
            }
            WatchScope::File(name) => relative == name,
        }
    }

    fn mode(&self) -> RecursiveMode {
        match self {
            WatchScope::Notes => RecursiveMode::Recursive,
            WatchScope::File(_) => RecursiveMode::NonRecursive,
        }
    }
}

/// Track last seen mtime to filter spurious events (Docker volume bug workaround)
type MtimeCache = Arc<Mutex<HashMap<String, SystemTime>>>;

pub struct FileWatcher {
    root: PathBuf,
    /// Debouncer handle (must keep alive)
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    event_rx: mpsc::UnboundedReceiver<FileEvent>,
}

impl FileWatcher {
    /// Watch the notes of a vault.
    pub fn notes(vault_path: PathBuf) -> Result<Self> {
        Self::new(vault_path, WatchScope::Notes)
    }

    /// Watch a single file.
    pub fn file(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("Not a file path: {}", path.display()))?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::new(parent, WatchScope::File(name.to_string()))
    }

    /// Uses a 200ms debounce period to avoid rapid-fire events during saves.
    pub fn new(root: PathBuf, scope: WatchScope) -> Result<Self> {
        // On macOS /var/folders/... is really /private/var/folders/..., and
        // FSEvents needs the real path.
        let root = root.canonicalize().unwrap_or(root);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let root_clone = root.clone();
        let mode = scope.mode();

        let mtime_cache: MtimeCache = Arc::new(Mutex::new(HashMap::new()));

        let mut debouncer = new_debouncer(
            Duration::from_millis(200),
            move |result: std::result::Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    for event in events {
                        if let Some(file_event) =
                            Self::process_event(&event, &root_clone, &scope, &mtime_cache)
                        {
                            if event_tx.send(file_event).is_err() {
                                // Receiver dropped
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("File watcher error: {}", e);
                }
            },
        )?;

        debouncer.watcher().watch(&root, mode)?;

        Ok(Self {
            root,
            _debouncer: debouncer,
            event_rx,
        })
    }

    /// Process a single debounced event, returning a FileEvent if relevant.
    fn process_event(
        event: &DebouncedEvent,
        root: &Path,
        scope: &WatchScope,
        mtime_cache: &MtimeCache,
    ) -> Option<FileEvent> {
        let path = &event.path;
        let relative = path.strip_prefix(root).ok()?.to_str()?.replace('\\', "/");

        if !scope.accepts(&relative) {
            return None;
        }

        let kind = if path.exists() {
            FileEventKind::Modified
        } else {
            FileEventKind::Deleted
        };

        let Ok(mut cache) = mtime_cache.lock() else {
            return None;
        };
        match kind {
            FileEventKind::Modified => {
                if let Ok(mtime) = std::fs::metadata(path).and_then(|m| m.modified()) {
                    if cache.get(&relative) == Some(&mtime) {
                        // Mtime unchanged - spurious event
                        return None;
                    }
                    cache.insert(relative.clone(), mtime);
                }
            }
            FileEventKind::Deleted => {
                cache.remove(&relative);
            }
        }

        debug!(path = %relative, kind = ?kind, "File event");

        Some(FileEvent {
            path: relative,
            kind,
        })
    }

    pub fn event_rx(&mut self) -> &mut mpsc::UnboundedReceiver<FileEvent> {
        &mut self.event_rx
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
