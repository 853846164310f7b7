//! Query Engine
//!
//! Rebuilds a filtered, sorted view of the log from every segment in the
//! logs directory, plain or compressed. There is no index: each query walks
//! all segments.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use tracing::{debug, warn};

use super::error::{StoreError, StoreResult};
use super::segment::{discover, SegmentFile};
use crate::types::{Filter, LogEntry, SortKey};
use crate::utils::local_today;

/// Read-only view over a logs directory
pub struct QueryEngine {
    logs_dir: PathBuf,
}

impl QueryEngine {
    /// Create a new QueryEngine
    pub fn new<P: AsRef<Path>>(logs_dir: P) -> Self {
        Self {
            logs_dir: logs_dir.as_ref().to_path_buf(),
        }
    }

    /// Load every entry, in segment-name order then append order
    ///
    /// Segments are decoded in parallel; the result order does not depend
    /// on it.
    pub fn load_all(&self) -> StoreResult<Vec<LogEntry>> {
        let segments = discover(&self.logs_dir)?;

        let per_segment: Vec<Vec<LogEntry>> = segments.par_iter().map(read_segment).collect();

        Ok(per_segment.into_iter().flatten().collect())
    }

    /// Entries matching `filter`, sorted by its key and truncated to its limit
    pub fn read_logs(&self, filter: &Filter) -> StoreResult<Vec<LogEntry>> {
        let matcher = Matcher::new(filter);

        let mut entries: Vec<LogEntry> = self
            .load_all()?
            .into_iter()
            .filter(|e| matcher.matches(e))
            .collect();

        sort_entries(&mut entries, filter.sort_by);

        if filter.limit > 0 {
            entries.truncate(filter.limit);
        }

        Ok(entries)
    }

    /// First entry with the given ID, walking segments in order
    pub fn get_by_id(&self, id: i64) -> StoreResult<LogEntry> {
        for segment in discover(&self.logs_dir)? {
            if let Some(entry) = read_segment(&segment).into_iter().find(|e| e.id == id) {
                return Ok(entry);
            }
        }

        Err(StoreError::NotFound(id))
    }
}

/// Parse every well-formed line of a segment
///
/// Lines that fail to parse are skipped. An unreadable segment, or a read
/// error part way through, keeps whatever was parsed before it.
pub fn read_segment(segment: &SegmentFile) -> Vec<LogEntry> {
    let mut entries = Vec::new();

    let mut reader = match segment.open_reader() {
        Ok(reader) => reader,
        Err(e) => {
            warn!(segment = %segment.path.display(), error = %e, "failed to open segment");
            return entries;
        }
    };

    let mut line = Vec::new();
    let mut line_num = 0usize;
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                line_num += 1;
                let trimmed = line.trim_ascii();
                if trimmed.is_empty() {
                    continue;
                }
                match LogEntry::from_json_line(trimmed) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => debug!(
                        segment = segment.file_name(),
                        line = line_num,
                        error = %e,
                        "skipping malformed entry"
                    ),
                }
            }
            Err(e) => {
                warn!(
                    segment = %segment.path.display(),
                    error = %e,
                    "segment read stopped early"
                );
                break;
            }
        }
    }

    entries
}

/// Filter criteria resolved once per query
struct Matcher<'a> {
    filter: &'a Filter,
    grep: Option<String>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    today: Option<String>,
}

impl<'a> Matcher<'a> {
    fn new(filter: &'a Filter) -> Self {
        Self {
            filter,
            grep: non_empty(&filter.grep).map(str::to_lowercase),
            since: non_empty(&filter.since).and_then(start_of_day),
            until: non_empty(&filter.until).and_then(start_of_day),
            today: filter.today.then(local_today),
        }
    }

    fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(user) = non_empty(&self.filter.user) {
            if entry.user != user {
                return false;
            }
        }

        if self.filter.failed_only && !entry.failed() {
            return false;
        }

        if let Some(command) = non_empty(&self.filter.command) {
            if !entry.command.contains(command) {
                return false;
            }
        }

        if let Some(grep) = &self.grep {
            let hit = [&entry.command, &entry.stdout, &entry.stderr]
                .iter()
                .any(|field| field.to_lowercase().contains(grep.as_str()));
            if !hit {
                return false;
            }
        }

        if self.since.is_some() || self.until.is_some() {
            let at = entry_instant(entry);
            if self.since.is_some_and(|since| at < since) {
                return false;
            }
            if self.until.is_some_and(|until| at > until) {
                return false;
            }
        }

        if let Some(today) = &self.today {
            if entry.date_str() != Some(today.as_str()) {
                return false;
            }
        }

        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// UTC midnight of a `YYYY-MM-DD` date; malformed dates yield `None`
fn start_of_day(date: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Entry timestamp as an instant; unparsable timestamps sort earliest
fn entry_instant(entry: &LogEntry) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&entry.timestamp)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Stable, descending sort by the requested key
///
/// `Time` compares timestamp strings byte-wise; RFC3339 timestamps written
/// with the same offset are fixed-width, so this matches chronological order.
pub fn sort_entries(entries: &mut [LogEntry], key: SortKey) {
    match key {
        SortKey::Duration => entries.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms)),
        SortKey::Exit => entries.sort_by(|a, b| b.exit_code.cmp(&a.exit_code)),
        SortKey::Time => entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
    }
}
