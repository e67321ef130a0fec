//! Copy-tree artifacts: a fresh directory mirroring the included files

use super::{ArchiveReport, ArchiveSource};
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, span, Level};

/// Copy every non-excluded file under the sources into a new `destination` directory.
///
/// The destination must not exist and its parent must. Any I/O failure aborts
/// the run; nothing already copied is removed, so a failed destination must be
/// discarded by the caller.
pub fn copy_archive(destination: &Path, source: &ArchiveSource<'_>) -> Result<ArchiveReport> {
    let span = span!(Level::INFO, "copy_archive", destination = %destination.display());
    let _enter = span.enter();

    fs::create_dir(destination).map_err(|e| Error::from_create(e, destination))?;
    info!(
        "Copying {} source path(s) from {} into {}",
        source.sources.len(),
        source.root.display(),
        destination.display()
    );

    let mut report = ArchiveReport::default();

    for file in source.files(destination) {
        let file = file?;

        if source.is_excluded(&file) {
            report.excluded += 1;
            continue;
        }

        let target = destination.join(&file.relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let size = fs::copy(&file.path, &target)?;
        debug!("Copied {} ({} bytes)", file.relative, size);
        report.record_entry(file.relative, file.path, size);
    }

    info!(
        "Copy completed: {} files, {} bytes, {} excluded",
        report.entries.len(),
        report.total_bytes(),
        report.excluded
    );

    Ok(report)
}
