//! Segment file naming and discovery
//!
//! A segment is named `store-YYYY-MM-DD` after the UTC date it was opened.
//! Compressed segments carry a `.gz` suffix. Anything else in the logs
//! directory is ignored.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDate;
use flate2::read::MultiGzDecoder;
use tracing::warn;

use super::error::{StoreError, StoreResult};

/// File name prefix shared by all segments
pub const SEGMENT_PREFIX: &str = "store-";
/// Suffix marking a gzip-compressed segment
pub const COMPRESSED_SUFFIX: &str = ".gz";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A segment file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFile {
    pub path: PathBuf,
    /// UTC date the segment was opened
    pub date: NaiveDate,
    pub compressed: bool,
}

impl SegmentFile {
    /// Parse a segment path; fails for names outside the segment pattern
    pub fn from_path<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::InvalidSegmentName(path.display().to_string()))?;

        let (date, compressed) =
            parse_name(name).ok_or_else(|| StoreError::InvalidSegmentName(name.to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            date,
            compressed,
        })
    }

    /// File name component, used as the sort key
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Path the compressed twin of this segment would have
    pub fn compressed_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(COMPRESSED_SUFFIX);
        PathBuf::from(name)
    }

    /// Size and modification time
    pub fn stat(&self) -> io::Result<(u64, SystemTime)> {
        let metadata = fs::metadata(&self.path)?;
        Ok((metadata.len(), metadata.modified()?))
    }

    /// Open the segment for line-by-line reading, decompressing if needed
    pub fn open_reader(&self) -> io::Result<Box<dyn BufRead + Send>> {
        let file = File::open(&self.path)?;
        let reader: Box<dyn Read + Send> = if self.compressed {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(Box::new(BufReader::new(reader)))
    }
}

/// Name of the plain segment opened on `date`
pub fn segment_name(date: NaiveDate) -> String {
    format!("{}{}", SEGMENT_PREFIX, date.format(DATE_FORMAT))
}

/// Path of the plain segment opened on `date` under `dir`
pub fn segment_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(segment_name(date))
}

fn parse_name(name: &str) -> Option<(NaiveDate, bool)> {
    let rest = name.strip_prefix(SEGMENT_PREFIX)?;
    let (date_part, compressed) = match rest.strip_suffix(COMPRESSED_SUFFIX) {
        Some(date_part) => (date_part, true),
        None => (rest, false),
    };

    if date_part.len() != 10 {
        return None;
    }
    let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()?;
    Some((date, compressed))
}

/// Recursively enumerate every segment under `dir`, sorted by file name
///
/// A missing directory yields no segments. Unreadable subdirectories are
/// logged and skipped.
pub fn discover(dir: &Path) -> StoreResult<Vec<SegmentFile>> {
    let mut segments = Vec::new();

    if !dir.exists() {
        return Ok(segments);
    }

    walk(dir, &mut segments)?;

    segments.sort_by(|a, b| {
        a.file_name()
            .cmp(b.file_name())
            .then_with(|| a.path.cmp(&b.path))
    });

    Ok(segments)
}

fn walk(dir: &Path, segments: &mut Vec<SegmentFile>) -> StoreResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to stat path");
                continue;
            }
        };

        if file_type.is_dir() {
            if let Err(e) = walk(&path, segments) {
                warn!(dir = %path.display(), error = %e, "skipping unreadable directory");
            }
        } else if let Ok(segment) = SegmentFile::from_path(&path) {
            segments.push(segment);
        }
    }

    Ok(())
}
