//! Storage Manager
//!
//! Manages the segment directory and coordinates segment reads/writes.
//!
//! ## Responsibilities
//! - Enumerate existing segments (numbering and newest-first scan order)
//! - Search segments newest → oldest for reads
//! - Write new segments from MemTable flushes
//!
//! No file handle outlives a single call: every lookup opens the segments
//! it needs and closes them before returning.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TideError};
use crate::memtable::{Lookup, MemTable};

use super::{SSTable, SSTableBuilder, SSTableReader};

/// Filename prefix of every segment (`sst1`, `sst2`, ...)
const SEGMENT_PREFIX: &str = "sst";

/// Manages the storage layer
///
/// Stateless apart from its directory; the segment counter lives with the
/// engine so it is guarded by the engine's lock.
#[derive(Debug, Clone)]
pub struct StorageManager {
    /// Directory where segments are stored
    data_dir: PathBuf,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// Removes `.tmp` leftovers from flushes that crashed before their
    /// rename.
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if Self::is_stale_temp(&file_path) {
                tracing::warn!(path = %file_path.display(), "removing incomplete segment");
                fs::remove_file(&file_path)?;
            }
        }

        Ok(Self {
            data_dir: path.to_path_buf(),
        })
    }

    /// Existing segment numbers, ascending
    pub fn segment_ids(&self) -> Result<Vec<u64>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(id) = Self::parse_segment_id(&entry.path()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Number of segments on disk
    pub fn count_segments(&self) -> Result<usize> {
        Ok(self.segment_ids()?.len())
    }

    /// Number the next flush should use (highest existing + 1, or 1)
    pub fn next_segment_id(&self) -> Result<u64> {
        Ok(self.segment_ids()?.last().map(|&id| id + 1).unwrap_or(1))
    }

    /// Get a value by key (searches all segments newest → oldest)
    ///
    /// The first segment that knows the key decides: `Found` or
    /// `Tombstone`. Segments whose key range excludes the key are never
    /// scanned.
    pub fn get(&self, key: &[u8]) -> Result<Lookup> {
        for id in self.segment_ids()?.into_iter().rev() {
            let mut reader = SSTableReader::open(&self.segment_path(id))?;

            if !reader.might_contain(key) {
                continue;
            }

            let lookup = reader.get(key)?;
            if lookup.is_terminal() {
                tracing::trace!(segment = id, "key resolved in segment");
                return Ok(lookup);
            }
        }

        Ok(Lookup::Absent)
    }

    /// Write a MemTable to segment `id`
    ///
    /// Entries go out in the memtable's ascending key order, so the first
    /// and last keys written are the segment's true bounds.
    pub fn write_segment(&self, id: u64, memtable: &MemTable) -> Result<SSTable> {
        if memtable.is_empty() {
            return Err(TideError::Storage(
                "Cannot flush empty MemTable".to_string(),
            ));
        }

        let mut builder = SSTableBuilder::new(&self.segment_path(id))?;
        for (key, entry) in memtable.iter() {
            builder.add_entry(key, entry)?;
        }
        builder.finish()
    }

    /// Open a segment's header (for inspection and tests)
    pub fn open_segment(&self, id: u64) -> Result<SSTableReader> {
        SSTableReader::open(&self.segment_path(id))
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File path of segment `id`
    pub fn segment_path(&self, id: u64) -> PathBuf {
        self.data_dir.join(format!("{}{}", SEGMENT_PREFIX, id))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Parse a segment number from a filename
    /// "sst42" → Some(42); "sst42.tmp", "sst", "sst0" → None
    fn parse_segment_id(path: &Path) -> Option<u64> {
        let name = path.file_name()?.to_str()?;
        let digits = name.strip_prefix(SEGMENT_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().filter(|&id| id > 0)
    }

    fn is_stale_temp(path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        match name.strip_prefix(SEGMENT_PREFIX) {
            Some(rest) => rest
                .strip_suffix(".tmp")
                .map(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                .unwrap_or(false),
            None => false,
        }
    }
}
