//! block-sync-daemon library: Exposes internal modules for testing.
//!
//! This is a thin library layer over the daemon components,
//! allowing integration tests to access internal types.

pub mod command;
pub mod draft;
pub mod host;
pub mod native_fs;
pub mod prompt;
pub mod watcher;

// Re-export key types for convenience
pub use command::Command;
pub use draft::{DraftSurface, EchoTracker};
pub use host::{Host, HostConfig};
pub use native_fs::NativeFs;
pub use prompt::{LineSource, TerminalPrompt};
pub use watcher::{FileEvent, FileEventKind, FileWatcher};
