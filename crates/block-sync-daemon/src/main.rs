//! block-sync: keeps a draft file and a vault note in sync from the terminal.
//!
//! The draft stands in for the editor: edit it with anything, and the daemon
//! saves it into the note with the same debounce, conflict and backup rules
//! as the Obsidian plugin.

use anyhow::{Context, Result};
use clap::Parser;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use block_sync::{Settings, SyncMode};
use block_sync_daemon::command::{Command, HELP};
use block_sync_daemon::{FileWatcher, Host, HostConfig, LineSource, TerminalPrompt};

#[derive(Parser, Debug)]
#[command(name = "block-sync")]
#[command(about = "Sync a draft file with a vault note")]
struct Args {
    /// Path to the vault directory
    #[arg(short, long)]
    vault: PathBuf,

    /// Note to open, relative to the vault
    #[arg(short, long)]
    file: String,

    /// Draft file acting as the editor (created if missing)
    #[arg(short, long)]
    draft: PathBuf,

    /// Settings JSON (camelCase keys, all optional)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Override the sync mode from the settings
    #[arg(short, long, value_parser = parse_mode)]
    mode: Option<SyncMode>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn parse_mode(value: &str) -> std::result::Result<SyncMode, String> {
    match value {
        "auto" => Ok(SyncMode::Auto),
        "manual" => Ok(SyncMode::Manual),
        other => Err(format!("expected auto or manual, got {:?}", other)),
    }
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings {}", path.display()))?;
            Settings::from_json(&json)?
        }
        None => Settings::default(),
    };
    if let Some(mode) = args.mode {
        settings.sync_mode = mode;
    }
    Ok(settings)
}

/// Resolves when the auto save is due; never when none is pending.
async fn wait_until(due: Option<Duration>) {
    match due {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries prompts and notices.
    // Respects RUST_LOG, defaults to info (or debug with --verbose)
    let default_filter = if args.verbose {
        "debug,block_sync=debug,block_sync_daemon=debug"
    } else {
        "info,block_sync=info,block_sync_daemon=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = load_settings(&args)?;
    info!("Starting block-sync");
    info!("Vault path: {:?}", args.vault);
    info!("Draft path: {:?}", args.draft);
    info!(mode = %settings.sync_mode, debounce_ms = settings.debounce_ms, "Settings loaded");

    let lines = LineSource::stdin();
    let config = HostConfig {
        vault: args.vault.clone(),
        draft: args.draft.clone(),
        settings,
    };
    let mut host = Host::new(config, TerminalPrompt::new(lines.clone()))?;
    host.start(&args.file).await?;

    // The draft must exist before its directory can be watched
    let mut draft_watcher = FileWatcher::file(&args.draft)?;
    let mut vault_watcher = FileWatcher::notes(args.vault.clone())?;
    info!("File watchers started");

    println!("{}", HELP);

    loop {
        let due = host.until_due();
        tokio::select! {
            Some(event) = draft_watcher.event_rx().recv() => {
                host.on_draft_event(&event);
            }

            Some(event) = vault_watcher.event_rx().recv() => {
                host.on_vault_event(&event).await;
            }

            _ = wait_until(due) => {
                host.on_timer().await;
            }

            line = lines.next_line() => {
                let Some(line) = line else {
                    info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line) {
                    Ok(command) => {
                        if let ControlFlow::Break(()) = host.on_command(command).await {
                            break;
                        }
                    }
                    Err(message) => println!("{}", message),
                }
            }

            // Handle graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    let outcome = host.shutdown().await;
    info!(outcome = ?outcome, "Shutting down");
    Ok(())
}
