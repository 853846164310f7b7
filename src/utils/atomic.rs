//! Atomic file operations
//!
//! Small state files (the ID counter) are replaced with the
//! write-temp, sync, rename pattern so a reader sees either the old
//! or the new content, never a partial write.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Suffix of in-flight temporary files
const TEMP_EXTENSION: &str = "tmp";

/// Atomically replace the content of a file
///
/// 1. Writes content to a `.tmp` sibling
/// 2. Syncs the file to disk
/// 3. Renames it over the final path
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> io::Result<()> {
    let path = path.as_ref();
    let temp_path = path.with_extension(TEMP_EXTENSION);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Remove `.tmp` files left in `dir` by interrupted writes
///
/// Returns the number of files removed.
pub fn cleanup_temp_files<P: AsRef<Path>>(dir: P) -> io::Result<usize> {
    let dir = dir.as_ref();
    let mut cleaned = 0;

    if !dir.exists() {
        return Ok(0);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && path.extension().map(|e| e == TEMP_EXTENSION).unwrap_or(false) {
            fs::remove_file(&path)?;
            cleaned += 1;
        }
    }

    Ok(cleaned)
}
