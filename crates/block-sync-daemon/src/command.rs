//! Commands typed on stdin while the daemon runs.

use block_sync::SyncMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Save now (manual sync)
    Sync,
    /// Bind another note
    Open(String),
    Mode(SyncMode),
    /// Print the sync state as JSON
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  sync                 save the draft to the note now
  open <path>          switch to another note
  mode auto|manual     change the sync mode
  status               print the sync state
  quit                 save pending changes and exit";

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        match (name, arg) {
            ("sync" | "s", "") => Ok(Command::Sync),
            ("open" | "o", "") => Err("open needs a note path".to_string()),
            ("open" | "o", path) => Ok(Command::Open(path.to_string())),
            ("mode", "auto") => Ok(Command::Mode(SyncMode::Auto)),
            ("mode", "manual") => Ok(Command::Mode(SyncMode::Manual)),
            ("mode", other) => Err(format!("Unknown mode {:?} (auto or manual)", other)),
            ("status", "") => Ok(Command::Status),
            ("help" | "?", "") => Ok(Command::Help),
            ("quit" | "q" | "exit", "") => Ok(Command::Quit),
            _ => Err(format!("Unknown command {:?}; type help", line)),
        }
    }
}
