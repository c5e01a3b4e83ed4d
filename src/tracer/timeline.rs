//! Timeline file output for sampled steps.
//!
//! Files are named `timeline-<n>` with `n` drawn from a counter owned by the
//! writer, not from the step counter. Existing files are never overwritten.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::TraceError;

/// File name prefix for written timelines.
pub const TIMELINE_PREFIX: &str = "timeline-";

/// Writes encoded payloads to sequentially numbered files in one directory.
#[derive(Debug)]
pub struct TimelineWriter {
    dir: PathBuf,
    next_index: AtomicU64,
}

impl TimelineWriter {
    /// Create a writer rooted at `dir`. The directory must be absolute.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, TraceError> {
        let dir = normalize_dir(dir.into())?;
        Ok(Self {
            dir,
            next_index: AtomicU64::new(0),
        })
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of indices handed out so far, including failed writes.
    pub fn issued(&self) -> u64 {
        self.next_index.load(Ordering::Relaxed)
    }

    /// Path of the timeline with the given index.
    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{TIMELINE_PREFIX}{index}"))
    }

    /// Claim the next index and write `bytes` to a new file.
    ///
    /// Returns the index together with the written path.
    pub fn write(&self, bytes: &[u8]) -> Result<(u64, PathBuf), TraceError> {
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        let path = self.path_for(index);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| TraceError::Io {
                path: path.clone(),
                source,
            })?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|source| TraceError::Io {
                path: path.clone(),
                source,
            })?;

        Ok((index, path))
    }
}

/// Validate the trace directory and strip any trailing separator.
pub fn normalize_dir(dir: PathBuf) -> Result<PathBuf, TraceError> {
    if !dir.is_absolute() {
        return Err(TraceError::RelativePath(dir));
    }
    // Rebuilding from components drops trailing separators and `.` segments.
    Ok(dir.components().collect())
}
