//! Data types for the command audit log
//!
//! This module contains the record, query and summary structures shared by
//! the store, the executor and the CLI.

mod entry;
mod filter;
mod summary;

pub use entry::{
    CommandRecord, LogEntry, REDACTED_COMMAND, REDACTED_OUTPUT, SENSITIVE_KEYWORDS,
};
pub use filter::{Filter, SortKey};
pub use summary::{CommandStat, DirStat, HourStat, Summary, TOP_N};
