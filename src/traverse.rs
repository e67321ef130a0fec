//! Walking source paths under a root directory

use crate::exclusion::is_child_of;
use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A regular file found under one of the source paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path on disk
    pub path: PathBuf,
    /// Path relative to the root, always with forward slashes
    pub relative: String,
}

impl SourceFile {
    /// Final segment of the relative path
    pub fn file_name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or(&self.relative)
    }
}

/// Render `path` relative to `root` in forward-slash form
pub fn relative_to(path: &Path, root: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| Error::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })?;

    let parts: Vec<_> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect();
    Ok(parts.join("/"))
}

/// Resolve a source path against the root; relative sources live under it
pub fn resolve_source(root: &Path, source: &Path) -> PathBuf {
    if source.is_absolute() {
        source.to_path_buf()
    } else {
        root.join(source)
    }
}

/// `path` made absolute against the current directory, with `.` and `..`
/// folded lexically. The filesystem is not consulted.
pub fn absolute_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalised = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalised.pop();
            }
            other => normalised.push(other),
        }
    }
    normalised
}

/// Lazily walk every source path, yielding regular files only.
///
/// Directories and symlinks are never yielded. Visiting order follows the
/// filesystem and is not stable; use [`collect_sorted`] when order matters.
pub fn walk<'a, P>(root: &'a Path, sources: &'a [P]) -> impl Iterator<Item = Result<SourceFile>> + 'a
where
    P: AsRef<Path> + 'a,
{
    walk_pruned(root, sources, None)
}

/// Like [`walk`], but never descends into `prune` or yields anything under it.
///
/// Both sides are made absolute before comparing, so a relative `prune` is
/// still recognised under an absolute root and the other way round.
pub fn walk_pruned<'a, P>(
    root: &'a Path,
    sources: &'a [P],
    prune: Option<&'a Path>,
) -> impl Iterator<Item = Result<SourceFile>> + 'a
where
    P: AsRef<Path> + 'a,
{
    let prune = prune.map(absolute_path);
    sources.iter().flat_map(move |source| {
        let source = resolve_source(root, source.as_ref());
        let prune = prune.clone();
        debug!("Walking source path {}", source.display());

        WalkDir::new(source)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| {
                prune
                    .as_ref()
                    .map_or(true, |pruned| !is_child_of(&absolute_path(entry.path()), pruned))
            })
            .filter_map(move |entry| match entry {
                Ok(entry) if !entry.file_type().is_file() => None,
                Ok(entry) => {
                    let path = entry.into_path();
                    Some(relative_to(&path, root).map(|relative| SourceFile { path, relative }))
                }
                Err(e) => Some(Err(Error::Walk(e))),
            })
    })
}

/// Walk every source path and sort the files by relative path
pub fn collect_sorted<P: AsRef<Path>>(root: &Path, sources: &[P]) -> Result<Vec<SourceFile>> {
    let mut files = walk(root, sources).collect::<Result<Vec<_>>>()?;
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}
