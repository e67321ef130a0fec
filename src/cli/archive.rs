//! Archive command implementation.

use crate::archive::ArchiveFormat;
use crate::backup::{destination_inside_sources, BackupEngine, BackupRequest};
use crate::config::ArchiveConfig;
use crate::{Error, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

/// Arguments for the archive command
#[derive(Args)]
pub struct ArchiveArgs {
    /// Root directory; entry names and exclusion rules are relative to it
    #[arg(short, long)]
    pub root: PathBuf,

    /// Source path to include, relative to the root or absolute (repeatable)
    #[arg(short, long, required = true, action = clap::ArgAction::Append)]
    pub source: Vec<PathBuf>,

    /// Zip file or copy directory to create
    #[arg(short, long)]
    pub dest: PathBuf,

    /// Artifact format: zip or copy (overrides the config file)
    #[arg(short, long)]
    pub format: Option<ArchiveFormat>,

    /// Exclusion rule, appended after those in the config file (repeatable)
    #[arg(short, long, action = clap::ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Name recorded on the backup; defaults to the root directory name
    #[arg(short, long)]
    pub world: Option<String>,

    /// TOML config file with archiving settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fail if any file could not be archived
    #[arg(long)]
    pub strict: bool,
}

impl ArchiveArgs {
    fn resolve_config(&self) -> Result<ArchiveConfig> {
        let mut config = match &self.config {
            Some(path) => ArchiveConfig::load(path)?,
            None => ArchiveConfig::default(),
        };

        config.excluded.extend(self.exclude.iter().cloned());
        if let Some(format) = self.format {
            config.format = format;
        }
        Ok(config)
    }

    fn world_name(&self) -> String {
        self.world.clone().unwrap_or_else(|| {
            self.root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "world".to_string())
        })
    }
}

/// Run the archive command
pub fn run(args: ArchiveArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let request = BackupRequest::new(
        args.world_name(),
        &args.root,
        args.source.clone(),
        &args.dest,
    );

    if destination_inside_sources(&request.root, &request.sources, &request.destination) {
        warn!(
            "Destination {} lies inside a source path; it will be left out of the artifact",
            request.destination.display()
        );
    }

    let engine = BackupEngine::new(config);
    let outcome = engine.run(&request)?;

    println!("{}", serde_json::to_string_pretty(&outcome.backup)?);

    let failures: Vec<_> = outcome.report.failures().collect();
    if failures.is_empty() {
        info!("All {} files archived", outcome.report.entries.len());
        return Ok(());
    }

    eprintln!("{} file(s) could not be archived:", failures.len());
    for skipped in &failures {
        eprintln!("  {} ({})", skipped.path.display(), skipped.reason);
    }

    if args.strict {
        return Err(Error::Incomplete {
            missing: failures.len(),
            destination: args.dest.clone(),
        });
    }
    Ok(())
}
