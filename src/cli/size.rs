//! Size command implementation.

use crate::size::{file_or_dir_size, human_size};
use crate::Result;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the size command
#[derive(Args)]
pub struct SizeArgs {
    /// File or directory to measure
    pub path: PathBuf,

    /// Print the byte count instead of the human-readable form
    #[arg(long)]
    pub raw: bool,
}

/// Run the size command
pub fn run(args: SizeArgs) -> Result<()> {
    let bytes = file_or_dir_size(&args.path);
    if args.raw {
        println!("{}", bytes);
    } else {
        println!("{}", human_size(bytes));
    }
    Ok(())
}
