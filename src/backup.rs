//! Running a complete archiving pass and assembling its [`Backup`] record

use crate::archive::{write_archive, ArchiveFormat, ArchiveReport, ArchiveSource};
use crate::config::ArchiveConfig;
use crate::exclusion::is_child_of;
use crate::hash::{hash_files, ContentHash, HashOrdering};
use crate::record::{compression_ratio, Backup};
use crate::size::{file_or_dir_size, human_size};
use crate::traverse::{absolute_path, resolve_source, SourceFile};
use crate::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{info, span, warn, Level};

/// What to back up and where the artifact goes
#[derive(Debug, Clone)]
pub struct BackupRequest {
    /// Name recorded on the resulting [`Backup`]
    pub world_name: String,
    /// Base directory for entry names and exclusion rules
    pub root: PathBuf,
    /// Sub-trees of `root` to include
    pub sources: Vec<PathBuf>,
    /// Zip file or copy directory to create; must not exist
    pub destination: PathBuf,
}

impl BackupRequest {
    pub fn new(
        world_name: impl Into<String>,
        root: impl Into<PathBuf>,
        sources: Vec<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            world_name: world_name.into(),
            root: root.into(),
            sources,
            destination: destination.into(),
        }
    }
}

/// A finished run: the record plus what was written and skipped
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub backup: Backup,
    pub report: ArchiveReport,
}

impl BackupOutcome {
    /// Whether every candidate file made it into the artifact
    pub fn is_complete(&self) -> bool {
        self.report.is_complete()
    }
}

/// Runs archiving passes with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct BackupEngine {
    config: ArchiveConfig,
}

impl BackupEngine {
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn format(&self) -> ArchiveFormat {
        self.config.format
    }

    /// Archive the request's sources and build the [`Backup`] record.
    ///
    /// Errors mean the run failed outright and the destination must be
    /// discarded. An `Ok` outcome may still carry skipped files; check
    /// [`BackupOutcome::is_complete`].
    pub fn run(&self, request: &BackupRequest) -> Result<BackupOutcome> {
        let span = span!(
            Level::INFO,
            "backup",
            world = %request.world_name,
            format = %self.config.format
        );
        let _enter = span.enter();

        info!(
            "Starting backup of {} into {}",
            request.root.display(),
            request.destination.display()
        );

        let matcher = self.config.matcher();
        let source = ArchiveSource::new(&request.root, &request.sources, &matcher);
        let report = write_archive(
            self.config.format,
            &request.destination,
            &source,
            &self.config.zip_options(),
        )?;

        let size = file_or_dir_size(&request.destination);
        let original = report.total_bytes();
        let ratio = compression_ratio(size, original);
        let sha1 = archived_set_hash(&report);

        let backup = Backup::new(
            request.world_name.clone(),
            Utc::now(),
            request.destination.clone(),
            size,
            ratio,
            sha1,
            String::new(),
        );

        info!(
            "Backup of '{}' completed: {} files, {} -> {} (ratio {:.2})",
            backup.world_name,
            report.entries.len(),
            human_size(original),
            human_size(size),
            ratio
        );
        for skipped in report.failures() {
            warn!("Not archived: {} ({})", skipped.path.display(), skipped.reason);
        }

        Ok(BackupOutcome { backup, report })
    }
}

/// Sorted file-set hash over the entries a run wrote
fn archived_set_hash(report: &ArchiveReport) -> ContentHash {
    let files: Vec<SourceFile> = report
        .entries
        .iter()
        .map(|entry| SourceFile {
            path: entry.source.clone(),
            relative: entry.relative.clone(),
        })
        .collect();

    hash_files(&files, HashOrdering::Sorted).unwrap_or_else(|e| {
        warn!("Could not hash archived file set: {}", e);
        ContentHash::empty()
    })
}

/// Whether `destination` would be swept up by walking `sources` under `root`
pub fn destination_inside_sources(root: &Path, sources: &[PathBuf], destination: &Path) -> bool {
    let destination = absolute_path(destination);
    sources.iter().any(|source| {
        let source = absolute_path(&resolve_source(root, source));
        is_child_of(&destination, &source)
    })
}
