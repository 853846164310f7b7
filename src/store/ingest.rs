//! Ingestion Queue
//!
//! Producers push entries into a bounded channel; one dedicated writer
//! thread drains it and appends each entry as a JSON line to today's
//! segment. Only the writer touches segment files on this path, so appends
//! never interleave.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error};

use super::error::{StoreError, StoreResult};
use super::segment::segment_path;
use crate::types::LogEntry;
use crate::utils::utc_today;

/// Counters maintained by the writer thread
#[derive(Debug, Default)]
pub struct IngestStats {
    written: AtomicU64,
    failures: AtomicU64,
}

impl IngestStats {
    /// Entries durably appended
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::SeqCst)
    }

    /// Entries lost to write failures
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }
}

/// Bounded queue with a single background segment writer
pub struct IngestQueue {
    /// `None` once closed
    sender: Mutex<Option<mpsc::Sender<LogEntry>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<IngestStats>,
}

impl IngestQueue {
    /// Spawn the writer thread for `logs_dir`
    pub fn start(logs_dir: PathBuf, capacity: usize, sync_writes: bool) -> StoreResult<Self> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let stats = Arc::new(IngestStats::default());

        let writer = SegmentWriter {
            logs_dir,
            sync_writes,
            stats: Arc::clone(&stats),
        };

        let handle = thread::Builder::new()
            .name("memlog-ingest".to_string())
            .spawn(move || writer.run(rx))?;

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(handle)),
            stats,
        })
    }

    /// Queue an entry for writing
    ///
    /// Blocks while the queue is full. Must not be called from within an
    /// async runtime worker thread.
    pub fn enqueue(&self, entry: LogEntry) -> StoreResult<()> {
        let sender = self.sender.lock().clone().ok_or(StoreError::Closed)?;
        sender.blocking_send(entry).map_err(|_| StoreError::Closed)
    }

    /// Whether the queue still accepts entries
    pub fn is_open(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Stop accepting entries, drain everything already queued and wait
    /// for the writer thread to exit. Safe to call more than once.
    pub fn close(&self) {
        // Dropping the last sender ends the writer loop once drained
        drop(self.sender.lock().take());

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                error!("ingest writer thread panicked");
            }
        }
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }
}

impl Drop for IngestQueue {
    fn drop(&mut self) {
        self.close();
    }
}

/// The consumer side, owned by the writer thread
struct SegmentWriter {
    logs_dir: PathBuf,
    sync_writes: bool,
    stats: Arc<IngestStats>,
}

impl SegmentWriter {
    fn run(self, mut rx: mpsc::Receiver<LogEntry>) {
        debug!(dir = %self.logs_dir.display(), "ingest writer started");

        while let Some(entry) = rx.blocking_recv() {
            match self.append(&entry) {
                Ok(path) => {
                    self.stats.written.fetch_add(1, Ordering::SeqCst);
                    debug!(id = entry.id, segment = %path.display(), "entry appended");
                }
                Err(e) => {
                    self.stats.failures.fetch_add(1, Ordering::SeqCst);
                    error!(id = entry.id, error = %e, "failed to append log entry");
                }
            }
        }

        debug!(
            written = self.stats.written(),
            failures = self.stats.failures(),
            "ingest writer drained"
        );
    }

    /// Append one entry to today's segment, creating it if absent
    fn append(&self, entry: &LogEntry) -> StoreResult<PathBuf> {
        let path = segment_path(&self.logs_dir, utc_today());
        ensure_dir(&self.logs_dir)?;

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut line = entry.to_json_line()?;
        line.push('\n');
        file.write_all(line.as_bytes())?;

        if self.sync_writes {
            file.sync_data()?;
        }

        Ok(path)
    }
}

fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)
}
