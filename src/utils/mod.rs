//! Utility functions and helpers
//!
//! Atomic file replacement, timestamps and host identity.

pub mod atomic;
pub mod time;

pub use atomic::{atomic_write, cleanup_temp_files};
pub use time::{get_current_user, get_cwd, get_hostname, local_today, now_rfc3339, utc_today};
