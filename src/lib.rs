//! # backup-archiver
//!
//! Backup archiving engine: turns a set of source paths under a root
//! directory into a copy-tree or ZIP artifact, filtered by exclusion rules,
//! with SHA-1 integrity hashes and size reporting.
//!
//! ## Features
//!
//! - **Exclusion rules**: file name, relative path, prefix, suffix and substring patterns
//! - **Copy and ZIP artifacts**: entries named by root-relative paths, timestamps preserved
//! - **Partial-failure reporting**: files skipped in zip mode are listed, not silently lost
//! - **Reproducible hashes**: file-set digests fold in sorted relative-path order
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use backup_archiver::{ArchiveConfig, BackupEngine, BackupRequest};
//! use std::path::PathBuf;
//!
//! # fn main() -> backup_archiver::Result<()> {
//! let config = ArchiveConfig {
//!     excluded: vec!["session.lock".to_string(), "*.log".to_string()],
//!     ..ArchiveConfig::default()
//! };
//! let engine = BackupEngine::new(config);
//!
//! let request = BackupRequest::new(
//!     "world",
//!     "/srv/minecraft",
//!     vec![PathBuf::from("world")],
//!     "/srv/backups/world.zip",
//! );
//! let outcome = engine.run(&request)?;
//! println!("{} ({})", outcome.backup.sha1, outcome.backup.size_string());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod exclusion;
pub mod hash;
pub mod logging;
pub mod record;
pub mod size;
pub mod traverse;

// Re-export commonly used types
pub use archive::{ArchiveFormat, ArchiveReport, SkipReason};
pub use backup::{BackupEngine, BackupOutcome, BackupRequest};
pub use config::ArchiveConfig;
pub use error::{Error, Result};
pub use exclusion::ExclusionMatcher;
pub use hash::ContentHash;
pub use record::Backup;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
