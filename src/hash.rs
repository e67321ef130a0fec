//! SHA-1 content hashes for files and file sets

use crate::traverse::{collect_sorted, walk, SourceFile};
use crate::Result;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::warn;

/// A hex-encoded SHA-1 digest.
///
/// The empty value is a sentinel meaning "hash unavailable", never the hash
/// of empty content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    /// The hash-unavailable sentinel
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Hash raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_digest(&Sha1::digest(data))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_available(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order in which file digests are folded into a file-set hash
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashOrdering {
    /// Sort by relative path first; reproducible across platforms and runs
    #[default]
    Sorted,
    /// Fold in the order given, which for a walk is filesystem order
    Traversal,
}

fn digest_file(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_vec())
}

/// SHA-1 of a file's raw bytes, streamed
pub fn file_hash(path: &Path) -> Result<ContentHash> {
    Ok(ContentHash::from_digest(&digest_file(path)?))
}

/// Like [`file_hash`] but returns the empty sentinel on I/O failure
pub fn file_sha1(path: &Path) -> ContentHash {
    file_hash(path).unwrap_or_else(|e| {
        warn!("Could not hash {}: {}", path.display(), e);
        ContentHash::empty()
    })
}

/// Fold the digests of `files` into one SHA-1.
///
/// Each file contributes its 20 raw digest bytes. With
/// [`HashOrdering::Sorted`] the result depends only on the set of relative
/// paths and contents, not on the order of `files`.
pub fn hash_files(files: &[SourceFile], ordering: HashOrdering) -> Result<ContentHash> {
    let mut ordered: Vec<&SourceFile> = files.iter().collect();
    if ordering == HashOrdering::Sorted {
        ordered.sort_by(|a, b| a.relative.cmp(&b.relative));
    }

    let mut hasher = Sha1::new();
    for file in ordered {
        hasher.update(digest_file(&file.path)?);
    }
    Ok(ContentHash::from_digest(&hasher.finalize()))
}

/// File-set hash of every regular file under `root`, in sorted order
pub fn directory_hash(root: &Path) -> Result<ContentHash> {
    directory_hash_with(root, HashOrdering::Sorted)
}

/// File-set hash of every regular file under `root` with an explicit ordering
pub fn directory_hash_with(root: &Path, ordering: HashOrdering) -> Result<ContentHash> {
    let sources = [root];
    let files = match ordering {
        HashOrdering::Sorted => collect_sorted(root, &sources)?,
        HashOrdering::Traversal => walk(root, &sources).collect::<Result<Vec<_>>>()?,
    };
    hash_files(&files, ordering)
}

/// Like [`directory_hash`] but returns the empty sentinel on failure
pub fn directory_sha1(root: &Path) -> ContentHash {
    directory_hash(root).unwrap_or_else(|e| {
        warn!("Could not hash directory {}: {}", root.display(), e);
        ContentHash::empty()
    })
}
