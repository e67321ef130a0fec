//! Tracing subscriber setup for the command-line binary
//!
//! Logs go to stderr as text or JSON, or to a file. `RUST_LOG` overrides the
//! default level.

use crate::{Error, Result};
use std::path::Path;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn filter(quiet: bool) -> EnvFilter {
    let level = if quiet { Level::WARN } else { Level::INFO };
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Install the global subscriber writing to stderr; `RUST_LOG` overrides the level
pub fn init_logging(quiet: bool, format: LogFormat) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(quiet))
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| Error::Configuration {
        reason: format!("Failed to initialise logging: {}", e),
    })
}

/// Install the global subscriber appending plain lines to `log_file`
pub fn init_file_logging(log_file: &Path, quiet: bool) -> Result<()> {
    use std::fs::OpenOptions;

    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(quiet))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| Error::Configuration {
            reason: format!("Failed to initialise logging: {}", e),
        })
}
