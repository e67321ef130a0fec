//! backup-archiver - copy-tree and ZIP backups
//!
//! Main binary entry point for the command-line interface.

use anyhow::Result;
use backup_archiver::cli::{Cli, Commands};
use backup_archiver::logging;
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.log_file {
        Some(path) => logging::init_file_logging(path, cli.quiet)?,
        None => logging::init_logging(cli.quiet, cli.log_format.into())?,
    }

    match cli.command {
        Commands::Archive(args) => backup_archiver::cli::archive::run(args)?,
        Commands::Hash(args) => backup_archiver::cli::hash::run(args)?,
        Commands::Size(args) => backup_archiver::cli::size::run(args)?,
    }

    Ok(())
}
