//! Hash command implementation.

use crate::exclusion::ExclusionMatcher;
use crate::hash::{directory_hash_with, file_hash, hash_files, HashOrdering};
use crate::traverse::collect_sorted;
use crate::Result;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the hash command
#[derive(Args)]
pub struct HashArgs {
    /// File or directory to hash
    pub path: PathBuf,

    /// Fold directory files in filesystem order instead of sorted order
    #[arg(long)]
    pub traversal_order: bool,

    /// Leave out files matching this exclusion rule (repeatable, directories only)
    #[arg(short, long, action = clap::ArgAction::Append)]
    pub exclude: Vec<String>,
}

/// Run the hash command
pub fn run(args: HashArgs) -> Result<()> {
    let ordering = if args.traversal_order {
        HashOrdering::Traversal
    } else {
        HashOrdering::Sorted
    };

    let hash = if !args.path.is_dir() {
        file_hash(&args.path)?
    } else if args.exclude.is_empty() {
        directory_hash_with(&args.path, ordering)?
    } else {
        let matcher = ExclusionMatcher::new(&args.exclude);
        let files: Vec<_> = collect_sorted(&args.path, &[&args.path])?
            .into_iter()
            .filter(|file| !matcher.matches(&file.relative))
            .collect();
        hash_files(&files, ordering)?
    };

    println!("{}  {}", hash, args.path.display());
    Ok(())
}
