//! Command-line interface for the archiving engine.

use crate::logging::LogFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod archive;
pub mod hash;
pub mod size;

/// backup-archiver - copy-tree and ZIP backups with exclusion rules and SHA-1 hashes
#[derive(Parser)]
#[command(name = "backup-archiver")]
#[command(about = "Copy-tree and ZIP backups with exclusion rules and SHA-1 hashes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Only log warnings and errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Log format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Archive source paths into a zip file or copy directory
    Archive(archive::ArchiveArgs),
    /// Print the SHA-1 of a file or directory
    Hash(hash::HashArgs),
    /// Print the size of a file or directory
    Size(size::SizeArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
