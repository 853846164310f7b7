//! Segment rotation, compression and retention
//!
//! Provides functionality for:
//! - Compressing segments that grew past a size threshold
//! - Compressing segments untouched for more than a day
//! - Deleting segments older than the retention window
//! - Reporting total segment size
//!
//! Batch operations never stop at the first failing file: each failure is
//! logged, recorded in the returned [`MaintenanceReport`], and processing
//! continues with the next segment.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{info, warn};

use super::error::{StoreError, StoreResult};
use super::segment::{discover, SegmentFile};

const BYTES_PER_MB: u64 = 1024 * 1024;
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Outcome of a batch maintenance operation
#[derive(Debug, Default)]
pub struct MaintenanceReport {
    /// Segments the operation acted on (source paths)
    pub processed: Vec<PathBuf>,
    /// Segments that failed, with the error for each
    pub failures: Vec<(PathBuf, StoreError)>,
}

impl MaintenanceReport {
    /// Whether every attempted segment succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, path: &Path, action: &str, error: StoreError) {
        warn!(path = %path.display(), error = %error, "failed to {} segment", action);
        self.failures.push((path.to_path_buf(), error));
    }
}

/// Information about a segment on disk
#[derive(Debug, Clone)]
pub struct SegmentInfo {
    pub segment: SegmentFile,
    /// Size in bytes
    pub size: u64,
    pub modified: SystemTime,
}

/// Segment lifecycle manager for a logs directory
pub struct SegmentManager {
    logs_dir: PathBuf,
}

impl SegmentManager {
    /// Create a new SegmentManager
    pub fn new<P: AsRef<Path>>(logs_dir: P) -> Self {
        Self {
            logs_dir: logs_dir.as_ref().to_path_buf(),
        }
    }

    /// The managed directory
    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// List all segments with size and modification time
    ///
    /// Segments that cannot be stat'ed are skipped.
    pub fn list_segments(&self) -> StoreResult<Vec<SegmentInfo>> {
        let mut infos = Vec::new();

        for segment in discover(&self.logs_dir)? {
            match segment.stat() {
                Ok((size, modified)) => infos.push(SegmentInfo {
                    segment,
                    size,
                    modified,
                }),
                Err(e) => {
                    warn!(path = %segment.path.display(), error = %e, "failed to stat segment");
                }
            }
        }

        Ok(infos)
    }

    /// Compress every plain segment larger than `max_size_mb` whole megabytes
    ///
    /// Today's segment is not excluded; run this while ingestion is idle.
    pub fn rotate_if_needed(&self, max_size_mb: u64) -> StoreResult<MaintenanceReport> {
        let mut report = MaintenanceReport::default();

        for info in self.list_segments()? {
            if info.segment.compressed {
                continue;
            }

            if info.size / BYTES_PER_MB > max_size_mb {
                self.compress_into_report(&info.segment, &mut report);
            }
        }

        Ok(report)
    }

    /// Compress every plain segment last modified more than a day ago
    pub fn compress_old_logs(&self) -> StoreResult<MaintenanceReport> {
        let cutoff = cutoff_days(1);
        let mut report = MaintenanceReport::default();

        for info in self.list_segments()? {
            if info.segment.compressed {
                continue;
            }

            if info.modified < cutoff {
                self.compress_into_report(&info.segment, &mut report);
            }
        }

        Ok(report)
    }

    /// Delete every segment, compressed or not, last modified more than
    /// `days` days ago
    pub fn clean_old_logs(&self, days: u32) -> StoreResult<MaintenanceReport> {
        let cutoff = cutoff_days(days);
        let mut report = MaintenanceReport::default();

        for info in self.list_segments()? {
            if info.modified >= cutoff {
                continue;
            }

            match fs::remove_file(&info.segment.path) {
                Ok(()) => {
                    info!(segment = info.segment.file_name(), "removed old segment");
                    report.processed.push(info.segment.path);
                }
                Err(e) => report.fail(&info.segment.path, "remove", e.into()),
            }
        }

        Ok(report)
    }

    /// Total size of all segments in bytes
    pub fn total_size_bytes(&self) -> StoreResult<u64> {
        Ok(self.list_segments()?.iter().map(|s| s.size).sum())
    }

    /// Total size of all segments in whole megabytes (truncated)
    pub fn total_size_mb(&self) -> StoreResult<u64> {
        Ok(self.total_size_bytes()? / BYTES_PER_MB)
    }

    fn compress_into_report(&self, segment: &SegmentFile, report: &mut MaintenanceReport) {
        match compress_segment(segment) {
            Ok(_) => report.processed.push(segment.path.clone()),
            Err(e) => report.fail(&segment.path, "compress", e),
        }
    }
}

/// Gzip a plain segment into its `.gz` twin and remove the source
///
/// When the twin already exists (today's segment rotated earlier and then
/// appended to again) the source is added to it as a further gzip member,
/// which [`MultiGzDecoder`](flate2::read::MultiGzDecoder) reads back as one
/// stream. Bytes already in the twin are never rewritten.
///
/// The source is only removed once the compressed data is complete and
/// synced. On failure a newly created `.gz` is removed, an existing one is
/// truncated back to its previous length, and the source is left untouched.
pub fn compress_segment(segment: &SegmentFile) -> StoreResult<PathBuf> {
    if segment.compressed {
        return Err(StoreError::InvalidSegmentName(
            segment.file_name().to_string(),
        ));
    }

    let target = segment.compressed_path();
    let mut input = File::open(&segment.path)?;
    let (output, previous_len) = open_target(&target)?;

    if let Err(e) = write_gzip(&mut input, &output) {
        match previous_len {
            Some(len) => {
                let _ = output.set_len(len);
            }
            None => {
                let _ = fs::remove_file(&target);
            }
        }
        return Err(e.into());
    }

    fs::remove_file(&segment.path)?;

    info!(
        from = segment.file_name(),
        to = %target.file_name().unwrap_or_default().to_string_lossy(),
        appended = previous_len.is_some(),
        "compressed segment"
    );

    Ok(target)
}

/// Create the `.gz` twin, or open an existing one for appending
///
/// Returns the existing length when the twin was already there.
fn open_target(target: &Path) -> io::Result<(File, Option<u64>)> {
    match File::create_new(target) {
        Ok(file) => Ok((file, None)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let file = OpenOptions::new().append(true).open(target)?;
            let len = file.metadata()?.len();
            Ok((file, Some(len)))
        }
        Err(e) => Err(e),
    }
}

fn write_gzip(input: &mut File, output: &File) -> io::Result<()> {
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
    io::copy(input, &mut encoder)?;

    let mut writer = encoder.finish()?;
    writer.flush()?;

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

fn cutoff_days(days: u32) -> SystemTime {
    let age = Duration::from_secs(u64::from(days) * SECS_PER_DAY);
    SystemTime::now()
        .checked_sub(age)
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::{GzDecoder, MultiGzDecoder};
    use std::io::Read;
    use tempfile::TempDir;

    fn age(path: &Path, days: u64) {
        let file = File::options().write(true).open(path).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(days * SECS_PER_DAY);
        file.set_modified(mtime).unwrap();
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_compress_segment_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store-2026-10-16");
        fs::write(&path, "{\"id\":1}\n{\"id\":2}\n").unwrap();

        let segment = SegmentFile::from_path(&path).unwrap();
        let target = compress_segment(&segment).unwrap();

        assert!(!path.exists());
        assert_eq!(target, temp_dir.path().join("store-2026-10-16.gz"));

        let mut content = String::new();
        GzDecoder::new(File::open(&target).unwrap())
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "{\"id\":1}\n{\"id\":2}\n");
    }

    fn gzip(content: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn gunzip_all(path: &Path) -> String {
        let mut content = String::new();
        MultiGzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn test_compress_appends_to_existing_twin() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store-2026-10-16");
        let gz = temp_dir.path().join("store-2026-10-16.gz");
        fs::write(&gz, gzip("{\"id\":1}\n")).unwrap();
        let earlier = fs::read(&gz).unwrap();
        fs::write(&path, "{\"id\":2}\n").unwrap();

        let segment = SegmentFile::from_path(&path).unwrap();
        let target = compress_segment(&segment).unwrap();

        assert_eq!(target, gz);
        assert!(!path.exists());
        assert!(fs::read(&gz).unwrap().starts_with(&earlier));
        assert_eq!(gunzip_all(&gz), "{\"id\":1}\n{\"id\":2}\n");
    }

    #[test]
    fn test_copy_failure_removes_partial_output() {
        let temp_dir = TempDir::new().unwrap();
        // Opening a directory succeeds, reading it does not
        let path = temp_dir.path().join("store-2026-10-16");
        fs::create_dir(&path).unwrap();

        let segment = SegmentFile::from_path(&path).unwrap();
        let err = compress_segment(&segment).unwrap_err();

        assert!(matches!(err, StoreError::Io(_)));
        assert!(!temp_dir.path().join("store-2026-10-16.gz").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn test_copy_failure_restores_existing_twin() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store-2026-10-16");
        let gz = temp_dir.path().join("store-2026-10-16.gz");
        fs::create_dir(&path).unwrap();
        fs::write(&gz, gzip("{\"id\":1}\n")).unwrap();
        let earlier = fs::read(&gz).unwrap();

        let segment = SegmentFile::from_path(&path).unwrap();
        assert!(compress_segment(&segment).is_err());

        assert_eq!(fs::read(&gz).unwrap(), earlier);
        assert!(path.is_dir());
    }

    #[test]
    fn test_rotate_by_size() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("store-2026-10-15"), vec![b'x'; 2 * 1024 * 1024]).unwrap();
        fs::write(dir.join("store-2026-10-16"), vec![b'x'; 500 * 1024]).unwrap();

        let manager = SegmentManager::new(dir);
        let report = manager.rotate_if_needed(1).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.processed, vec![dir.join("store-2026-10-15")]);
        assert_eq!(names(dir), vec!["store-2026-10-15.gz", "store-2026-10-16"]);

        // Nothing left above the threshold
        let report = manager.rotate_if_needed(1).unwrap();
        assert!(report.processed.is_empty());
    }

    #[test]
    fn test_compress_old_logs() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("store-2026-10-14"), "{}\n").unwrap();
        fs::write(dir.join("store-2026-10-17"), "{}\n").unwrap();
        age(&dir.join("store-2026-10-14"), 3);

        let manager = SegmentManager::new(dir);
        let report = manager.compress_old_logs().unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(names(dir), vec!["store-2026-10-14.gz", "store-2026-10-17"]);
    }

    #[test]
    fn test_clean_old_logs_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        for name in ["store-2026-08-01.gz", "store-2026-09-30", "store-2026-10-17"] {
            fs::write(dir.join(name), "{}\n").unwrap();
        }
        age(&dir.join("store-2026-08-01.gz"), 77);
        age(&dir.join("store-2026-09-30"), 17);

        let manager = SegmentManager::new(dir);

        let first = manager.clean_old_logs(7).unwrap();
        assert_eq!(first.processed.len(), 2);
        let after_first = names(dir);

        let second = manager.clean_old_logs(7).unwrap();
        assert!(second.processed.is_empty());
        assert_eq!(names(dir), after_first);
        assert_eq!(after_first, vec!["store-2026-10-17"]);
    }

    #[test]
    fn test_failure_does_not_abort_batch() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("store-2026-10-13"), "{}\n").unwrap();
        // A directory in place of the twin cannot be written to
        fs::create_dir(dir.join("store-2026-10-13.gz")).unwrap();
        fs::write(dir.join("store-2026-10-14"), "{}\n").unwrap();
        age(&dir.join("store-2026-10-13"), 4);
        age(&dir.join("store-2026-10-14"), 3);

        let manager = SegmentManager::new(dir);
        let report = manager.compress_old_logs().unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.processed, vec![dir.join("store-2026-10-14")]);
        assert!(dir.join("store-2026-10-13").exists());
        assert!(dir.join("store-2026-10-14.gz").exists());
    }

    #[test]
    fn test_total_size() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("store-2026-10-15.gz"), vec![0u8; 1024 * 1024]).unwrap();
        fs::write(dir.join("store-2026-10-16"), vec![b'x'; 1024 * 1024 + 10]).unwrap();
        fs::write(dir.join("unrelated.bin"), vec![0u8; 4 * 1024 * 1024]).unwrap();

        let manager = SegmentManager::new(dir);
        assert_eq!(manager.total_size_bytes().unwrap(), 2 * 1024 * 1024 + 10);
        assert_eq!(manager.total_size_mb().unwrap(), 2);
    }
}
