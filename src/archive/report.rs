//! Per-run report of what an archiving pass wrote and what it skipped.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A file that made it into the artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedEntry {
    /// Entry name, relative to the root in forward-slash form
    pub relative: String,
    /// Source file the entry was read from
    pub source: PathBuf,
    /// Length of the source file when it was archived
    pub size: u64,
}

/// Why a file was left out of a zip artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Base name is the reserved lock-file name
    ReservedName,
    /// File vanished between traversal and writing
    Missing,
    /// File or directory could not be opened for reading
    Unreadable(String),
    /// Copy into the entry failed part way; the entry may be empty or truncated
    CopyFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ReservedName => write!(f, "reserved lock file"),
            SkipReason::Missing => write!(f, "file no longer exists"),
            SkipReason::Unreadable(e) => write!(f, "unreadable: {}", e),
            SkipReason::CopyFailed(e) => write!(f, "copy failed: {}", e),
        }
    }
}

/// A file the archiving pass did not fully write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of a copy or zip pass that did not fail outright
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveReport {
    pub entries: Vec<ArchivedEntry>,
    pub skipped: Vec<SkippedEntry>,
    /// Files dropped by exclusion rules
    pub excluded: usize,
}

impl ArchiveReport {
    pub(crate) fn record_entry(&mut self, relative: String, source: PathBuf, size: u64) {
        self.entries.push(ArchivedEntry {
            relative,
            source,
            size,
        });
    }

    pub(crate) fn record_skip(&mut self, path: PathBuf, reason: SkipReason) {
        self.skipped.push(SkippedEntry { path, reason });
    }

    /// Total length of the source files that were archived
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|entry| entry.size).sum()
    }

    /// Skipped entries that indicate lost data rather than a deliberate skip
    pub fn failures(&self) -> impl Iterator<Item = &SkippedEntry> {
        self.skipped
            .iter()
            .filter(|entry| entry.reason != SkipReason::ReservedName)
    }

    /// True when every candidate file made it into the artifact
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}
