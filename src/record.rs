//! The record describing one finished backup

use crate::hash::ContentHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One completed archiving run. Built once, never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    /// Name of the world that was backed up
    pub world_name: String,
    /// When the artifact was completed
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub create_time: DateTime<Utc>,
    /// Path of the zip file or copy directory
    pub backup_location: PathBuf,
    /// Bytes on disk of the artifact
    pub size: u64,
    /// Artifact size divided by the size of the files archived
    pub ratio: f32,
    /// Hash of the archived file set; empty when it could not be computed
    pub sha1: ContentHash,
    /// Preview image reference, supplied by the caller
    #[serde(default)]
    pub preview: String,
}

impl Backup {
    pub fn new(
        world_name: impl Into<String>,
        create_time: DateTime<Utc>,
        backup_location: impl Into<PathBuf>,
        size: u64,
        ratio: f32,
        sha1: ContentHash,
        preview: impl Into<String>,
    ) -> Self {
        Self {
            world_name: world_name.into(),
            create_time,
            backup_location: backup_location.into(),
            size,
            ratio,
            sha1,
            preview: preview.into(),
        }
    }

    /// Same record with a preview reference attached
    pub fn with_preview(self, preview: impl Into<String>) -> Self {
        Self {
            preview: preview.into(),
            ..self
        }
    }

    pub fn location(&self) -> &Path {
        &self.backup_location
    }

    /// Whether the integrity hash was computed
    pub fn has_hash(&self) -> bool {
        self.sha1.is_available()
    }

    /// Human-readable artifact size
    pub fn size_string(&self) -> String {
        crate::size::human_size(self.size)
    }
}

/// `artifact / original`, or 0 when nothing was archived
pub fn compression_ratio(artifact: u64, original: u64) -> f32 {
    if original == 0 {
        0.0
    } else {
        (artifact as f64 / original as f64) as f32
    }
}
