//! Archive writers producing copy-tree and ZIP artifacts.
//!
//! Both writers walk the same filtered file set: every regular file under the
//! source paths, minus anything an exclusion rule matches and anything under
//! the artifact itself. Copy mode treats every I/O failure as fatal; zip mode
//! records per-file problems in the [`ArchiveReport`] and keeps going.

pub mod copy;
pub mod report;
pub mod zip;

pub use copy::copy_archive;
pub use report::{ArchiveReport, ArchivedEntry, SkipReason, SkippedEntry};
pub use zip::{zip_archive, ZipOptions, DEFAULT_LOCK_FILE_NAME};

use crate::exclusion::ExclusionMatcher;
use crate::traverse::{walk_pruned, SourceFile};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Kind of artifact an archiving run produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    #[default]
    Zip,
    Copy,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Zip => write!(f, "zip"),
            ArchiveFormat::Copy => write!(f, "copy"),
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "copy" => Ok(ArchiveFormat::Copy),
            other => Err(crate::Error::Configuration {
                reason: format!("Unknown archive format '{}', expected zip or copy", other),
            }),
        }
    }
}

/// The file set an archiving run reads from
#[derive(Debug, Clone)]
pub struct ArchiveSource<'a> {
    /// Base for entry names and exclusion matching
    pub root: &'a Path,
    /// Sub-trees of `root` to include
    pub sources: Vec<PathBuf>,
    pub matcher: &'a ExclusionMatcher,
}

impl<'a> ArchiveSource<'a> {
    pub fn new<P: AsRef<Path>>(root: &'a Path, sources: &[P], matcher: &'a ExclusionMatcher) -> Self {
        Self {
            root,
            sources: sources.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            matcher,
        }
    }

    /// Walk the sources, leaving out `artifact` so a run never archives itself
    pub(crate) fn files<'s>(&'s self, artifact: &'s Path) -> impl Iterator<Item = Result<SourceFile>> + 's {
        walk_pruned(self.root, &self.sources, Some(artifact))
    }

    pub(crate) fn is_excluded(&self, file: &SourceFile) -> bool {
        match self.matcher.matching_rule(&file.relative) {
            Some(rule) => {
                debug!("Excluding {} (rule '{}')", file.relative, rule.raw);
                true
            }
            None => false,
        }
    }
}

/// Write `source` to `destination` in the requested format
pub fn write_archive(
    format: ArchiveFormat,
    destination: &Path,
    source: &ArchiveSource<'_>,
    options: &ZipOptions,
) -> Result<ArchiveReport> {
    match format {
        ArchiveFormat::Copy => copy_archive(destination, source),
        ArchiveFormat::Zip => zip_archive(destination, source, options),
    }
}

/// Remove a partially written artifact; used by callers discarding a failed run
pub fn discard(destination: &Path) -> Result<()> {
    if destination.is_dir() {
        fs::remove_dir_all(destination)?;
    } else if destination.exists() {
        fs::remove_file(destination)?;
    }
    Ok(())
}
