//! Timestamped sibling names for conflict copies and backups.
//!
//! Names embed a local `YYYYMMDD-HHMMSS` stamp. Collisions are resolved by
//! `create_unique`, which relies on `FileSystem::create` refusing existing
//! paths, so two writers racing for the same name cannot clobber each other.

use crate::clock::Millis;
use crate::fs::{FileSystem, FsError, Result};
use chrono::{Local, TimeZone, Utc};

/// `YYYYMMDD-HHMMSS`
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Give up probing after this many taken names.
const MAX_ATTEMPTS: u32 = 1000;

/// Format a clock reading as a local `YYYYMMDD-HHMMSS` stamp.
pub fn format_timestamp(millis: Millis) -> String {
    let millis = millis as i64;
    match Local.timestamp_millis_opt(millis).single() {
        Some(local) => local.format(TIMESTAMP_FORMAT).to_string(),
        None => Utc
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or_default()
            .format(TIMESTAMP_FORMAT)
            .to_string(),
    }
}

/// A vault path split into directory, file stem and extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts<'a> {
    /// Parent directory without trailing slash ("" for the vault root).
    pub dir: &'a str,
    pub stem: &'a str,
    /// Extension without the dot.
    pub ext: Option<&'a str>,
}

impl<'a> PathParts<'a> {
    pub fn parse(path: &'a str) -> Self {
        let path = path.trim_matches('/');
        let (dir, name) = match path.rfind('/') {
            Some(pos) => (&path[..pos], &path[pos + 1..]),
            None => ("", path),
        };
        // Leading-dot names like ".env" have no extension
        let (stem, ext) = match name.rfind('.') {
            Some(pos) if pos > 0 => (&name[..pos], Some(&name[pos + 1..])),
            _ => (name, None),
        };
        Self { dir, stem, ext }
    }

    /// Join a file name onto this directory.
    pub fn sibling(&self, file_name: &str) -> String {
        if self.dir.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.dir, file_name)
        }
    }

    fn with_ext(&self, base: &str) -> String {
        match self.ext {
            Some(ext) => format!("{}.{}", base, ext),
            None => base.to_string(),
        }
    }
}

/// Candidate name for the `attempt`-th conflict copy of `path`.
///
/// `Note.md` becomes `Note (conflict 20240101-093000).md`, then
/// `Note (conflict 20240101-093000 2).md` and so on.
pub fn conflict_copy_candidate(path: &str, stamp: &str, attempt: u32) -> String {
    let parts = PathParts::parse(path);
    let base = if attempt == 0 {
        format!("{} (conflict {})", parts.stem, stamp)
    } else {
        format!("{} (conflict {} {})", parts.stem, stamp, attempt + 1)
    };
    parts.sibling(&parts.with_ext(&base))
}

/// Create a file at the first free candidate path and return that path.
///
/// `candidate(n)` yields the name for the n-th attempt, starting at 0.
pub async fn create_unique<F, N>(fs: &F, content: &str, candidate: N) -> Result<String>
where
    F: FileSystem + ?Sized,
    N: Fn(u32) -> String,
{
    for attempt in 0..MAX_ATTEMPTS {
        let path = candidate(attempt);
        match fs.create(&path, content).await {
            Ok(()) => return Ok(path),
            Err(FsError::AlreadyExists(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(FsError::AlreadyExists(candidate(MAX_ATTEMPTS)))
}

/// Write `content` to a new timestamped sibling of `path`.
pub async fn create_conflict_copy<F>(fs: &F, path: &str, content: &str, now: Millis) -> Result<String>
where
    F: FileSystem + ?Sized,
{
    let stamp = format_timestamp(now);
    create_unique(fs, content, |attempt| {
        conflict_copy_candidate(path, &stamp, attempt)
    })
    .await
}
