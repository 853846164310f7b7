//! memlog - command execution audit log
//!
//! Durably records shell command invocations (who, where, what, exit code,
//! output, duration) and lets operators query, rotate, compress and
//! summarize that history.
//!
//! # Modules
//!
//! - `store`: the log store engine (ID allocator, ingestion queue,
//!   segment lifecycle, query engine)
//! - `types`: records, query filters and history summaries
//! - `executor`: runs a shell command and submits its record
//! - `logging`: diagnostic `tracing` subscriber setup
//! - `utils`: atomic writes, timestamps, host identity
//!
//! # Example
//!
//! ```no_run
//! use memlog::{CommandRecord, Filter, LogStore, StoreConfig};
//!
//! let store = LogStore::open(StoreConfig::new("/tmp/memlog")).unwrap();
//! store
//!     .submit(CommandRecord::new("cargo build").with_user("alice").with_exit_code(101))
//!     .unwrap();
//! store.close();
//!
//! let failed = store.read_logs(&Filter::new().failed_only()).unwrap();
//! assert_eq!(failed.len(), 1);
//! ```

pub mod executor;
pub mod logging;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use store::{LogStore, MaintenanceReport, SegmentManager, StoreConfig, StoreError, StoreResult};
pub use types::{CommandRecord, Filter, LogEntry, SortKey, Summary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
