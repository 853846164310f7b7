//! ID Allocator
//!
//! Hands out strictly increasing entry IDs and persists the last issued
//! value to the counter file on every allocation.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

use crate::utils::atomic_write;

/// Persistent, strictly increasing ID sequence
pub struct IdAllocator {
    path: PathBuf,
    /// Last issued ID
    current: Mutex<i64>,
}

impl IdAllocator {
    /// Load the last issued ID from `path`
    ///
    /// A missing or unparsable counter file starts the sequence at zero.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let current = read_counter(&path).unwrap_or(0);

        Self {
            path,
            current: Mutex::new(current),
        }
    }

    /// Allocate the next ID
    ///
    /// The counter file is rewritten while the lock is held. A failed write
    /// is logged and swallowed; the in-memory sequence still advances.
    pub fn next(&self) -> i64 {
        let mut current = self.current.lock();
        *current += 1;

        if let Err(e) = atomic_write(&self.path, &current.to_string()) {
            warn!(
                path = %self.path.display(),
                id = *current,
                error = %e,
                "failed to persist ID counter"
            );
        }

        *current
    }

    /// Last issued ID, without advancing
    pub fn current(&self) -> i64 {
        *self.current.lock()
    }

    /// Path of the counter file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_counter(path: &Path) -> Option<i64> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}
