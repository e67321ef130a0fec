//! Byte sizes of files and directories, and their display form

use std::fs;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

pub const KB: u64 = 1024;
pub const MB: u64 = KB * 1024;
pub const GB: u64 = MB * 1024;
pub const TB: u64 = GB * 1024;

const UNITS: &[(u64, &str)] = &[(TB, "TB"), (GB, "GB"), (MB, "MB"), (KB, "KB")];

/// Size of a file, or the recursive sum of file lengths under a directory.
///
/// A path that does not exist has size 0. Entries that cannot be read while
/// walking a directory are logged and counted as 0.
pub fn file_or_dir_size(path: &Path) -> u64 {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return 0,
    };

    if metadata.is_file() {
        return metadata.len();
    }
    if !metadata.is_dir() {
        return 0;
    }

    WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping entry while sizing {}: {}", path.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

/// Format a byte count as `"<n>B"` or with one decimal and a 1024-based unit.
///
/// The decimal is rounded half up, so 1280 bytes is `"1.3KB"`.
pub fn human_size(bytes: u64) -> String {
    for &(unit, suffix) in UNITS {
        if bytes >= unit {
            let (bytes, unit) = (u128::from(bytes), u128::from(unit));
            let tenths = (bytes * 10 + unit / 2) / unit;
            return format!("{}.{}{}", tenths / 10, tenths % 10, suffix);
        }
    }
    format!("{}B", bytes)
}

/// [`human_size`] of [`file_or_dir_size`]
pub fn path_size_string(path: &Path) -> String {
    human_size(file_or_dir_size(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_human_size_thresholds() {
        assert_eq!(human_size(0), "0B");
        assert_eq!(human_size(1023), "1023B");
        assert_eq!(human_size(1024), "1.0KB");
        assert_eq!(human_size(1536), "1.5KB");
        assert_eq!(human_size(MB), "1.0MB");
        assert_eq!(human_size(1024 * 1024 * 1024 * 3), "3.0GB");
        assert_eq!(human_size(TB * 2 + TB / 2), "2.5TB");
        assert_eq!(human_size(TB * 4096), "4096.0TB");
    }

    #[test]
    fn test_human_size_rounds_half_up() {
        assert_eq!(human_size(1280), "1.3KB");
        assert_eq!(human_size(MB * 3 + MB / 4), "3.3MB");
        assert_eq!(human_size(1075), "1.0KB");
        assert_eq!(human_size(KB * 1023 + 1000), "1024.0KB");
        assert_eq!(human_size(u64::MAX), "16777216.0TB");
    }

    #[test]
    fn test_size_of_missing_path_is_zero() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(file_or_dir_size(&temp_dir.path().join("nope")), 0);
        assert_eq!(path_size_string(&temp_dir.path().join("nope")), "0B");
    }

    #[test]
    fn test_size_of_file_and_tree() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b/c"))?;
        fs::create_dir_all(root.join("empty"))?;
        fs::write(root.join("top.bin"), vec![0u8; 10])?;
        fs::write(root.join("a/one.bin"), vec![0u8; 1000])?;
        fs::write(root.join("a/b/c/two.bin"), vec![0u8; 2048])?;

        assert_eq!(file_or_dir_size(&root.join("top.bin")), 10);
        assert_eq!(file_or_dir_size(&root.join("a")), 3048);
        assert_eq!(file_or_dir_size(root), 3058);
        assert_eq!(file_or_dir_size(&root.join("empty")), 0);
        assert_eq!(path_size_string(&root.join("a")), "3.0KB");
        Ok(())
    }
}
