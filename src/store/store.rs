//! LogStore - the command audit log
//!
//! The LogStore owns the ID allocator and the ingestion queue. It is opened
//! once at process start, shared by reference (or `Arc`) with every
//! producer, and closed explicitly to flush pending entries.

use std::fs;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::config::StoreConfig;
use super::counter::IdAllocator;
use super::error::{StoreError, StoreResult};
use super::ingest::{IngestQueue, IngestStats};
use super::query::QueryEngine;
use super::rotation::{MaintenanceReport, SegmentManager};
use crate::types::{CommandRecord, Filter, LogEntry, Summary};
use crate::utils::{cleanup_temp_files, now_rfc3339};

/// Results of a full maintenance pass
#[derive(Debug, Default)]
pub struct MaintenanceSummary {
    pub rotated: MaintenanceReport,
    pub compressed: MaintenanceReport,
    pub cleaned: MaintenanceReport,
}

/// Durable, queryable command audit log
pub struct LogStore {
    config: StoreConfig,
    allocator: IdAllocator,
    queue: IngestQueue,
    /// Held across ID allocation and enqueue so append order follows ID order
    submit_lock: Mutex<()>,
    segments: SegmentManager,
    query: QueryEngine,
}

impl LogStore {
    /// Open (or create) the store described by `config`
    ///
    /// Creates the directory layout, loads the ID counter and starts the
    /// ingestion writer thread.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let logs_dir = config.logs_dir();
        fs::create_dir_all(&logs_dir)?;

        match cleanup_temp_files(config.root()) {
            Ok(0) => {}
            Ok(n) => debug!(count = n, "removed leftover temp files"),
            Err(e) => warn!(error = %e, "failed to clean up temp files"),
        }

        let allocator = IdAllocator::load(config.counter_path());
        let queue = IngestQueue::start(logs_dir.clone(), config.queue_capacity, config.sync_writes)?;

        info!(
            root = %config.root().display(),
            last_id = allocator.current(),
            "opened log store"
        );

        Ok(Self {
            segments: SegmentManager::new(&logs_dir),
            query: QueryEngine::new(&logs_dir),
            submit_lock: Mutex::new(()),
            allocator,
            queue,
            config,
        })
    }

    /// Open the store configured by the environment
    pub fn open_default() -> StoreResult<Self> {
        Self::open(StoreConfig::from_env())
    }

    /// Get the configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Record a finished command
    ///
    /// Sensitive commands are redacted before an ID is assigned. The entry is
    /// queued for the writer thread; this blocks only while the queue is
    /// full. Returns the assigned ID. Write failures surface in the log and
    /// in [`LogStore::ingest_stats`], not here.
    pub fn submit(&self, mut record: CommandRecord) -> StoreResult<i64> {
        if record.redact() {
            debug!("redacted sensitive command");
        }

        let _guard = self.submit_lock.lock();
        if !self.queue.is_open() {
            return Err(StoreError::Closed);
        }

        let id = self.allocator.next();
        let entry = LogEntry::from_record(record, id, now_rfc3339());
        self.queue.enqueue(entry)?;

        Ok(id)
    }

    /// Stop accepting submissions and wait until every queued entry is
    /// written. Idempotent; also runs on drop.
    pub fn close(&self) {
        // Waits out any submit in flight, so no ID is issued without its entry
        let _guard = self.submit_lock.lock();
        if !self.queue.is_open() {
            return;
        }
        self.queue.close();
        info!(
            written = self.queue.stats().written(),
            failures = self.queue.stats().failures(),
            last_id = self.allocator.current(),
            "closed log store"
        );
    }

    /// Whether the store still accepts submissions
    pub fn is_open(&self) -> bool {
        self.queue.is_open()
    }

    /// Writer thread counters
    pub fn ingest_stats(&self) -> &IngestStats {
        self.queue.stats()
    }

    /// Last issued entry ID
    pub fn last_id(&self) -> i64 {
        self.allocator.current()
    }

    /// Entries matching `filter`
    pub fn read_logs(&self, filter: &Filter) -> StoreResult<Vec<LogEntry>> {
        self.query.read_logs(filter)
    }

    /// Look up one entry by ID
    pub fn get_by_id(&self, id: i64) -> StoreResult<LogEntry> {
        self.query.get_by_id(id)
    }

    /// Statistics over entries within the optional date bounds
    pub fn summarize(&self, since: Option<&str>, until: Option<&str>) -> StoreResult<Summary> {
        let mut filter = Filter::new();
        filter.since = since.map(str::to_string);
        filter.until = until.map(str::to_string);

        let entries = self.query.read_logs(&filter)?;
        Ok(Summary::from_entries(&entries).with_range(filter.since, filter.until))
    }

    /// Segment lifecycle operations for this store's logs directory
    pub fn segments(&self) -> &SegmentManager {
        &self.segments
    }

    /// Compress segments above `max_size_mb`
    pub fn rotate_if_needed(&self, max_size_mb: u64) -> StoreResult<MaintenanceReport> {
        self.segments.rotate_if_needed(max_size_mb)
    }

    /// Compress segments untouched for more than a day
    pub fn compress_old_logs(&self) -> StoreResult<MaintenanceReport> {
        self.segments.compress_old_logs()
    }

    /// Delete segments older than `days`
    pub fn clean_old_logs(&self, days: u32) -> StoreResult<MaintenanceReport> {
        self.segments.clean_old_logs(days)
    }

    /// Total segment size in whole megabytes
    pub fn total_size_mb(&self) -> StoreResult<u64> {
        self.segments.total_size_mb()
    }

    /// Rotate, compress and clean using the configured thresholds
    pub fn run_maintenance(&self) -> StoreResult<MaintenanceSummary> {
        Ok(MaintenanceSummary {
            rotated: self.rotate_if_needed(self.config.max_size_mb)?,
            compressed: self.compress_old_logs()?,
            cleaned: self.clean_old_logs(self.config.retention_days)?,
        })
    }
}

impl Drop for LogStore {
    fn drop(&mut self) {
        self.close();
    }
}
