//! Terminal answers for conflict and switch dialogs.
//!
//! stdin is read by a single task that forwards lines into a channel. The
//! main loop and the prompt share that channel through `LineSource`: while
//! the sync manager awaits a decision the main loop is not polling, so the
//! next line goes to the prompt.

use async_trait::async_trait;
use block_sync::dialog::{self, ConflictPrompt, DialogError, SwitchPrompt};
use block_sync::{ConflictDecision, DecisionProvider, SwitchDecision};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

/// Shared receiver of input lines.
#[derive(Clone)]
pub struct LineSource {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
}

impl LineSource {
    pub fn new(rx: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Spawn a task forwarding stdin lines.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
            debug!("stdin closed");
        });
        Self::new(rx)
    }

    /// Next line, or `None` once input is closed.
    pub async fn next_line(&self) -> Option<String> {
        self.rx.lock().await.recv().await
    }
}

pub fn parse_conflict_answer(answer: &str) -> Option<ConflictDecision> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "o" | "overwrite" => Some(ConflictDecision::Overwrite),
        "e" | "external" | "accept" => Some(ConflictDecision::AcceptExternal),
        "b" | "both" | "keep-both" => Some(ConflictDecision::KeepBoth),
        "c" | "cancel" | "" => Some(ConflictDecision::Cancel),
        _ => None,
    }
}

pub fn parse_switch_answer(answer: &str) -> Option<SwitchDecision> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "s" | "save" => Some(SwitchDecision::SaveAndSwitch),
        "d" | "discard" => Some(SwitchDecision::DiscardAndSwitch),
        "c" | "cancel" | "" => Some(SwitchDecision::Cancel),
        _ => None,
    }
}

/// Asks on stdout, answers from a `LineSource`.
pub struct TerminalPrompt {
    lines: LineSource,
}

impl TerminalPrompt {
    pub fn new(lines: LineSource) -> Self {
        Self { lines }
    }

    async fn ask<T>(&self, question: &str, parse: fn(&str) -> Option<T>) -> dialog::Result<T> {
        loop {
            println!("{}", question);
            let line = self.lines.next_line().await.ok_or(DialogError::Dismissed)?;
            match parse(&line) {
                Some(answer) => return Ok(answer),
                None => println!("Unrecognized answer: {:?}", line.trim()),
            }
        }
    }
}

#[async_trait]
impl DecisionProvider for TerminalPrompt {
    async fn resolve_conflict(&self, prompt: &ConflictPrompt) -> dialog::Result<ConflictDecision> {
        println!("--- {} changed on disk while you had unsaved edits ---", prompt.path);
        println!("Your version:\n{}\n", prompt.local);
        println!("On disk:\n{}\n", prompt.external);
        self.ask(
            "[o]verwrite disk, accept [e]xternal, keep [b]oth, [c]ancel?",
            parse_conflict_answer,
        )
        .await
    }

    async fn confirm_switch(&self, prompt: &SwitchPrompt) -> dialog::Result<SwitchDecision> {
        let question = format!(
            "{} has unsaved changes. [s]ave and open {}, [d]iscard and open, [c]ancel?",
            prompt.current_path, prompt.new_path
        );
        self.ask(&question, parse_switch_answer).await
    }
}
