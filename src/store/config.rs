//! Store configuration and on-disk layout

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the store root
pub const ENV_HOME: &str = "MEMLOG_HOME";
/// Environment variable overriding the rotation threshold in megabytes
pub const ENV_MAX_SIZE_MB: &str = "MEMLOG_MAX_SIZE_MB";
/// Environment variable overriding the retention window in days
pub const ENV_RETENTION_DAYS: &str = "MEMLOG_RETENTION_DAYS";
/// Environment variable overriding the ingestion queue capacity
pub const ENV_QUEUE_CAPACITY: &str = "MEMLOG_QUEUE_CAPACITY";

/// Configuration for the LogStore
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store root; segments live under `logs/`, the counter at `counter`
    pub root: PathBuf,
    /// Pending entries accepted before `submit` blocks
    pub queue_capacity: usize,
    /// fsync every appended line
    pub sync_writes: bool,
    /// Size threshold used by `LogStore::run_maintenance`
    pub max_size_mb: u64,
    /// Retention window used by `LogStore::run_maintenance`
    pub retention_days: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            queue_capacity: 100,
            sync_writes: true,
            max_size_mb: 10,
            retention_days: 30,
        }
    }
}

impl StoreConfig {
    /// Create config with a custom store root
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Build config from the environment, falling back to defaults for
    /// unset or unparsable variables
    pub fn from_env() -> Self {
        let mut config = match env::var(ENV_HOME) {
            Ok(root) if !root.trim().is_empty() => Self::new(root),
            _ => Self::default(),
        };

        if let Some(mb) = parse_env(ENV_MAX_SIZE_MB) {
            config.max_size_mb = mb;
        }
        if let Some(days) = parse_env(ENV_RETENTION_DAYS) {
            config.retention_days = days;
        }
        if let Some(capacity) = parse_env::<usize>(ENV_QUEUE_CAPACITY) {
            config.queue_capacity = capacity.max(1);
        }

        config
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    pub fn with_max_size_mb(mut self, max_size_mb: u64) -> Self {
        self.max_size_mb = max_size_mb;
        self
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// Get the store root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get path to the segment directory
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Get path to the ID counter file
    pub fn counter_path(&self) -> PathBuf {
        self.root.join("counter")
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.trim().parse().ok()
}

/// `$HOME/.memlog`, or `./.memlog` if no home directory is known
fn default_root() -> PathBuf {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".memlog")
}
