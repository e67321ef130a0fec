//! Archiving settings, read from and written to TOML

use crate::archive::{ArchiveFormat, ZipOptions, DEFAULT_LOCK_FILE_NAME};
use crate::exclusion::ExclusionMatcher;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Settings for an archiving run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Exclusion rules, evaluated in order
    pub excluded: Vec<String>,
    /// Artifact kind
    pub format: ArchiveFormat,
    /// Base name never packed into zip artifacts
    pub lock_file_name: String,
    /// Deflate level for zip artifacts (0-9)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<i32>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            excluded: Vec::new(),
            format: ArchiveFormat::Zip,
            lock_file_name: DEFAULT_LOCK_FILE_NAME.to_string(),
            compression_level: None,
        }
    }
}

impl ArchiveConfig {
    /// Load settings from a TOML file; absent fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| Error::Configuration {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| Error::Configuration {
            reason: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write settings to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::Configuration {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content)?;
        debug!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(level) = self.compression_level {
            if !(0..=9).contains(&level) {
                return Err(Error::Configuration {
                    reason: format!("compression_level must be between 0 and 9, got {}", level),
                });
            }
        }
        if self.lock_file_name.contains(['/', '\\']) {
            return Err(Error::Configuration {
                reason: format!("lock_file_name must be a bare file name, got '{}'", self.lock_file_name),
            });
        }
        Ok(())
    }

    pub fn matcher(&self) -> ExclusionMatcher {
        ExclusionMatcher::new(&self.excluded)
    }

    pub fn zip_options(&self) -> ZipOptions {
        ZipOptions {
            lock_file_name: self.lock_file_name.clone(),
            compression_level: self.compression_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ArchiveConfig::default();
        assert_eq!(config.format, ArchiveFormat::Zip);
        assert_eq!(config.lock_file_name, "session.lock");
        assert!(config.matcher().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("archiver.toml");
        fs::write(
            &path,
            r#"
excluded = ["*.log", "world/DIM-1/*"]
format = "copy"
"#,
        )?;

        let config = ArchiveConfig::load(&path)?;
        assert_eq!(config.format, ArchiveFormat::Copy);
        assert_eq!(config.excluded, vec!["*.log", "world/DIM-1/*"]);
        assert_eq!(config.lock_file_name, "session.lock");
        assert!(config.matcher().matches("logs/latest.log"));
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested/archiver.toml");
        let config = ArchiveConfig {
            excluded: vec!["*cache*".to_string()],
            format: ArchiveFormat::Zip,
            lock_file_name: "session.lock".to_string(),
            compression_level: Some(6),
        };

        config.save(&path)?;
        assert_eq!(ArchiveConfig::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_invalid_values_are_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("archiver.toml");

        fs::write(&path, "compression_level = 12\n")?;
        assert!(matches!(ArchiveConfig::load(&path), Err(Error::Configuration { .. })));

        fs::write(&path, "format = \"tar\"\n")?;
        assert!(matches!(ArchiveConfig::load(&path), Err(Error::Configuration { .. })));

        fs::write(&path, "lock_file_name = \"world/session.lock\"\n")?;
        assert!(matches!(ArchiveConfig::load(&path), Err(Error::Configuration { .. })));
        Ok(())
    }
}
