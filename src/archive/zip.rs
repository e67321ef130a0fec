//! ZIP artifacts with preserved timestamps

use super::{ArchiveReport, ArchiveSource, SkipReason};
use crate::traverse::SourceFile;
use crate::{Error, Result};
use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, Write};
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info, span, warn, Level};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File name that is never packed, whatever the exclusion rules say
pub const DEFAULT_LOCK_FILE_NAME: &str = "session.lock";

/// Extended timestamp extra field ("UT")
const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;
const TS_MODIFIED: u8 = 0b001;
const TS_CREATED: u8 = 0b100;

/// Settings for zip artifacts
#[derive(Debug, Clone)]
pub struct ZipOptions {
    /// Base name never written to the archive
    pub lock_file_name: String,
    /// Deflate level; `None` uses the library default
    pub compression_level: Option<i32>,
}

impl Default for ZipOptions {
    fn default() -> Self {
        Self {
            lock_file_name: DEFAULT_LOCK_FILE_NAME.to_string(),
            compression_level: None,
        }
    }
}

/// Pack every non-excluded file under the sources into a new zip at `destination`.
///
/// Failing to create or finish the container is fatal. Problems with single
/// files are recorded in the returned report and the run continues.
pub fn zip_archive(
    destination: &Path,
    source: &ArchiveSource<'_>,
    options: &ZipOptions,
) -> Result<ArchiveReport> {
    let span = span!(Level::INFO, "zip_archive", destination = %destination.display());
    let _enter = span.enter();

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| Error::from_create(e, destination))?;

    info!(
        "Zipping {} source path(s) from {} into {}",
        source.sources.len(),
        source.root.display(),
        destination.display()
    );

    let mut writer = ZipWriter::new(BufWriter::new(file));
    let mut report = ArchiveReport::default();

    for file in source.files(destination) {
        let file = match file {
            Ok(file) => file,
            Err(Error::Walk(e)) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                warn!("Skipping unreadable path {}: {}", path.display(), e);
                report.record_skip(path, SkipReason::Unreadable(e.to_string()));
                continue;
            }
            Err(e) => return Err(e),
        };

        if source.is_excluded(&file) {
            report.excluded += 1;
            continue;
        }

        pack_file(&mut writer, &file, options, &mut report)?;
    }

    let mut out = writer.finish()?;
    out.flush()?;

    info!(
        "Zip completed: {} entries, {} bytes read, {} skipped, {} excluded",
        report.entries.len(),
        report.total_bytes(),
        report.skipped.len(),
        report.excluded
    );

    Ok(report)
}

/// Write one file as an entry. Only container errors are returned.
fn pack_file<W: Write + Seek>(
    writer: &mut ZipWriter<W>,
    file: &SourceFile,
    options: &ZipOptions,
    report: &mut ArchiveReport,
) -> Result<()> {
    if file.file_name() == options.lock_file_name {
        debug!("Skipping lock file {}", file.relative);
        report.record_skip(file.path.clone(), SkipReason::ReservedName);
        return Ok(());
    }

    if !file.path.exists() {
        debug!("Skipping vanished file {}", file.relative);
        report.record_skip(file.path.clone(), SkipReason::Missing);
        return Ok(());
    }

    let mut input = match File::open(&file.path) {
        Ok(input) => input,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            report.record_skip(file.path.clone(), SkipReason::Missing);
            return Ok(());
        }
        Err(e) => {
            warn!("Skipping unreadable file {}: {}", file.relative, e);
            report.record_skip(file.path.clone(), SkipReason::Unreadable(e.to_string()));
            return Ok(());
        }
    };

    let attributes = EntryAttributes::read(&input, &file.relative);
    write_entry(writer, file, &mut input, attributes, options, report)
}

/// Times and length carried over from the source file
#[derive(Debug, Clone, Copy, Default)]
struct EntryAttributes {
    modified: Option<SystemTime>,
    created: Option<SystemTime>,
    len: u64,
}

impl EntryAttributes {
    fn read(input: &File, relative: &str) -> Self {
        match input.metadata() {
            Ok(metadata) => Self {
                modified: metadata.modified().ok(),
                created: metadata.created().ok(),
                len: metadata.len(),
            },
            Err(e) => {
                warn!("Could not read attributes of {}: {}", relative, e);
                Self::default()
            }
        }
    }
}

/// Start an entry for `file` and stream `input` into it
fn write_entry<W: Write + Seek, R: Read>(
    writer: &mut ZipWriter<W>,
    file: &SourceFile,
    input: &mut R,
    attributes: EntryAttributes,
    options: &ZipOptions,
    report: &mut ArchiveReport,
) -> Result<()> {
    let mut entry_options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(options.compression_level)
        .large_file(attributes.len >= u32::MAX as u64);
    if let Some(time) = attributes.modified.and_then(dos_time) {
        entry_options = entry_options.last_modified_time(time);
    }

    match ExtendedTimestamp::new(attributes.modified, attributes.created) {
        Some(timestamp) => {
            writer.start_file_with_extra_data(file.relative.as_str(), entry_options)?;
            writer.write_all(&timestamp.local)?;
            writer.end_local_start_central_extra_data()?;
            writer.write_all(&timestamp.central)?;
            writer.end_extra_data()?;
        }
        None => writer.start_file(file.relative.as_str(), entry_options)?,
    }

    // The entry stays in the archive even if the copy fails; it is closed by
    // the next start_file or by finish.
    match io::copy(input, writer) {
        Ok(size) => {
            debug!("Packed {} ({} bytes)", file.relative, size);
            report.record_entry(file.relative.clone(), file.path.clone(), size);
        }
        Err(e) => {
            warn!("Failed to copy {} into archive: {}", file.relative, e);
            report.record_skip(file.path.clone(), SkipReason::CopyFailed(e.to_string()));
        }
    }

    Ok(())
}

/// Local-time DOS timestamp; `None` outside the 1980..2107 range zip supports
fn dos_time(time: SystemTime) -> Option<zip::DateTime> {
    let local: DateTime<Local> = time.into();
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}

fn unix_seconds(time: SystemTime) -> Option<i32> {
    let utc: DateTime<Utc> = time.into();
    i32::try_from(utc.timestamp()).ok()
}

/// Extended timestamp field bodies for the local and central headers.
///
/// The local header carries every time that is present; the central header
/// carries the same flags but only the modification time.
struct ExtendedTimestamp {
    local: Vec<u8>,
    central: Vec<u8>,
}

impl ExtendedTimestamp {
    fn new(modified: Option<SystemTime>, created: Option<SystemTime>) -> Option<Self> {
        let modified = modified.and_then(unix_seconds);
        let created = created.and_then(unix_seconds);

        let mut flags = 0u8;
        let mut local_body = Vec::with_capacity(9);
        let mut central_body = Vec::with_capacity(5);

        if let Some(mtime) = modified {
            flags |= TS_MODIFIED;
            local_body.extend_from_slice(&mtime.to_le_bytes());
            central_body.extend_from_slice(&mtime.to_le_bytes());
        }
        if let Some(ctime) = created {
            flags |= TS_CREATED;
            local_body.extend_from_slice(&ctime.to_le_bytes());
        }
        if flags == 0 {
            return None;
        }

        Some(Self {
            local: Self::field(flags, &local_body),
            central: Self::field(flags, &central_body),
        })
    }

    fn field(flags: u8, body: &[u8]) -> Vec<u8> {
        let mut field = Vec::with_capacity(5 + body.len());
        field.extend_from_slice(&EXTENDED_TIMESTAMP_ID.to_le_bytes());
        field.extend_from_slice(&((body.len() + 1) as u16).to_le_bytes());
        field.push(flags);
        field.extend_from_slice(body);
        field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::ExclusionMatcher;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn create_world(root: &Path) -> Result<()> {
        fs::create_dir_all(root.join("world/region"))?;
        fs::write(root.join("world/level.dat"), vec![1u8; 100])?;
        fs::write(root.join("world/session.lock"), vec![2u8; 10])?;
        fs::write(root.join("world/region/r.0.0.mca"), vec![3u8; 5000])?;
        Ok(())
    }

    fn entry_names(path: &Path) -> Result<Vec<String>> {
        let archive = ZipArchive::new(File::open(path)?)?;
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        Ok(names)
    }

    #[test]
    fn test_zip_excludes_rules_and_counts_considered_size() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("server");
        create_world(&root)?;

        let matcher = ExclusionMatcher::new(["session.lock"]);
        let sources = ["world"];
        let source = ArchiveSource::new(&root, &sources, &matcher);
        let destination = temp_dir.path().join("backup.zip");

        let report = zip_archive(&destination, &source, &ZipOptions::default())?;

        assert_eq!(
            entry_names(&destination)?,
            vec!["world/level.dat", "world/region/r.0.0.mca"]
        );
        assert_eq!(report.total_bytes(), 5100);
        assert_eq!(report.excluded, 1);
        assert!(report.skipped.is_empty());
        Ok(())
    }

    #[test]
    fn test_zip_never_packs_lock_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("server");
        create_world(&root)?;

        let matcher = ExclusionMatcher::default();
        let sources = ["world"];
        let source = ArchiveSource::new(&root, &sources, &matcher);
        let destination = temp_dir.path().join("backup.zip");

        let report = zip_archive(&destination, &source, &ZipOptions::default())?;

        let names = entry_names(&destination)?;
        assert!(names.iter().all(|name| !name.ends_with("session.lock")));
        assert_eq!(names.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::ReservedName);
        assert!(report.is_complete());
        Ok(())
    }

    #[test]
    fn test_zip_custom_lock_file_name() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("server");
        create_world(&root)?;
        fs::write(root.join("world/server.pid"), b"42")?;

        let matcher = ExclusionMatcher::default();
        let sources = ["world"];
        let source = ArchiveSource::new(&root, &sources, &matcher);
        let destination = temp_dir.path().join("backup.zip");
        let options = ZipOptions {
            lock_file_name: "server.pid".to_string(),
            compression_level: Some(9),
        };

        zip_archive(&destination, &source, &options)?;

        let names = entry_names(&destination)?;
        assert!(names.contains(&"world/session.lock".to_string()));
        assert!(!names.contains(&"world/server.pid".to_string()));
        Ok(())
    }

    #[test]
    fn test_zip_entries_round_trip_content() -> Result<()> {
        use std::io::Read;

        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("server");
        create_world(&root)?;

        let matcher = ExclusionMatcher::default();
        let sources = ["world"];
        let source = ArchiveSource::new(&root, &sources, &matcher);
        let destination = temp_dir.path().join("backup.zip");
        zip_archive(&destination, &source, &ZipOptions::default())?;

        let mut archive = ZipArchive::new(File::open(&destination)?)?;
        let mut entry = archive.by_name("world/region/r.0.0.mca")?;
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        assert_eq!(content, vec![3u8; 5000]);
        Ok(())
    }

    #[test]
    fn test_zip_refuses_existing_destination() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("server");
        create_world(&root)?;
        let destination = temp_dir.path().join("backup.zip");
        fs::write(&destination, b"previous")?;

        let matcher = ExclusionMatcher::default();
        let sources = ["world"];
        let source = ArchiveSource::new(&root, &sources, &matcher);
        let result = zip_archive(&destination, &source, &ZipOptions::default());

        assert!(matches!(result, Err(Error::AlreadyExists { .. })));
        assert_eq!(fs::read(&destination)?, b"previous");
        Ok(())
    }

    #[test]
    fn test_zip_missing_source_is_recorded_not_fatal() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("server");
        create_world(&root)?;

        let matcher = ExclusionMatcher::default();
        let sources = ["world", "DIM-1"];
        let source = ArchiveSource::new(&root, &sources, &matcher);
        let destination = temp_dir.path().join("backup.zip");

        let report = zip_archive(&destination, &source, &ZipOptions::default())?;

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.failures().count(), 1);
        assert!(matches!(report.failures().next().unwrap().reason, SkipReason::Unreadable(_)));
        Ok(())
    }

    #[test]
    fn test_zip_preserves_modification_time() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("server");
        create_world(&root)?;
        let mtime = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        File::options()
            .write(true)
            .open(root.join("world/level.dat"))?
            .set_modified(mtime)?;

        let matcher = ExclusionMatcher::default();
        let sources = ["world"];
        let source = ArchiveSource::new(&root, &sources, &matcher);
        let destination = temp_dir.path().join("backup.zip");
        zip_archive(&destination, &source, &ZipOptions::default())?;

        let mut archive = ZipArchive::new(File::open(&destination)?)?;
        let entry = archive.by_name("world/level.dat")?;

        let extra = entry.extra_data();
        assert_eq!(&extra[..2], &EXTENDED_TIMESTAMP_ID.to_le_bytes());
        assert_eq!(&extra[2..4], &5u16.to_le_bytes());
        assert_ne!(extra[4] & TS_MODIFIED, 0);
        assert_eq!(&extra[5..9], &1_600_000_000i32.to_le_bytes());

        let expected: DateTime<Local> = mtime.into();
        let dos = entry.last_modified();
        assert_eq!(
            (dos.year(), dos.month(), dos.day(), dos.hour(), dos.minute(), dos.second()),
            (
                expected.year() as u16,
                expected.month() as u8,
                expected.day() as u8,
                expected.hour() as u8,
                expected.minute() as u8,
                expected.second() as u8,
            )
        );
        Ok(())
    }

    #[test]
    fn test_vanished_file_is_recorded_as_missing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let gone = SourceFile {
            path: temp_dir.path().join("gone"),
            relative: "gone".to_string(),
        };
        let mut writer = ZipWriter::new(io::Cursor::new(Vec::new()));
        let mut report = ArchiveReport::default();

        pack_file(&mut writer, &gone, &ZipOptions::default(), &mut report)?;

        assert!(report.entries.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::Missing);
        let archive = ZipArchive::new(writer.finish()?)?;
        assert_eq!(archive.len(), 0);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_file_without_read_permission_is_recorded_as_unreadable() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("level.dat");
        fs::write(&path, b"level")?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000))?;
        if File::open(&path).is_ok() {
            // Running with privileges that ignore file modes
            return Ok(());
        }

        let file = SourceFile {
            path,
            relative: "level.dat".to_string(),
        };
        let mut writer = ZipWriter::new(io::Cursor::new(Vec::new()));
        let mut report = ArchiveReport::default();
        pack_file(&mut writer, &file, &ZipOptions::default(), &mut report)?;

        assert!(report.entries.is_empty());
        assert!(matches!(report.skipped[0].reason, SkipReason::Unreadable(_)));
        Ok(())
    }

    /// Hands out `remaining` bytes, then fails every read
    struct BrokenReader {
        remaining: usize,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "device disconnected"));
            }
            let n = self.remaining.min(buf.len());
            buf[..n].fill(9);
            self.remaining -= n;
            Ok(n)
        }
    }

    #[test]
    fn test_copy_failure_keeps_archiving() -> Result<()> {
        let broken = SourceFile {
            path: PathBuf::from("/server/world/region/r.0.0.mca"),
            relative: "world/region/r.0.0.mca".to_string(),
        };
        let level = SourceFile {
            path: PathBuf::from("/server/world/level.dat"),
            relative: "world/level.dat".to_string(),
        };
        let options = ZipOptions::default();
        let mut writer = ZipWriter::new(io::Cursor::new(Vec::new()));
        let mut report = ArchiveReport::default();

        write_entry(
            &mut writer,
            &broken,
            &mut BrokenReader { remaining: 64 },
            EntryAttributes::default(),
            &options,
            &mut report,
        )?;
        write_entry(
            &mut writer,
            &level,
            &mut &b"level"[..],
            EntryAttributes::default(),
            &options,
            &mut report,
        )?;

        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0].reason, SkipReason::CopyFailed(_)));
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].relative, "world/level.dat");

        let mut archive = ZipArchive::new(writer.finish()?)?;
        let mut content = Vec::new();
        archive.by_name("world/level.dat")?.read_to_end(&mut content)?;
        assert_eq!(content, b"level");
        Ok(())
    }

    #[test]
    fn test_extended_timestamp_layout() {
        let mtime = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let ctime = UNIX_EPOCH + Duration::from_secs(1_600_000_000);

        let ts = ExtendedTimestamp::new(Some(mtime), Some(ctime)).unwrap();
        assert_eq!(ts.local.len(), 4 + 1 + 8);
        assert_eq!(ts.local[4], TS_MODIFIED | TS_CREATED);
        assert_eq!(&ts.local[5..9], &1_700_000_000i32.to_le_bytes());
        assert_eq!(&ts.local[9..13], &1_600_000_000i32.to_le_bytes());
        assert_eq!(ts.central.len(), 4 + 1 + 4);
        assert_eq!(&ts.central[2..4], &5u16.to_le_bytes());

        assert!(ExtendedTimestamp::new(None, None).is_none());
    }
}
