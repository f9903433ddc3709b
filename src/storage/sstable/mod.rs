//! SSTable Module
//!
//! Segment files - immutable, key-range-indexed, sorted on-disk records.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (variable)                                       │
//! │   Magic: u32 LE = 123456789 (4)                         │
//! │   MinKeyLen: u32 LE (4) | MinKey                        │
//! │   MaxKeyLen: u32 LE (4) | MaxKey                        │
//! │   EntryCount: u32 LE (4)                                │
//! ├─────────────────────────────────────────────────────────┤
//! │ Records (EntryCount of them, same layout as the WAL)    │
//! │   [Op: u8][KeyLen: u32][Key][ValLen: u32][Value]        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are in ascending key order, so `[MinKey, MaxKey]` bounds every
//! key in the file and lets a lookup skip the file without scanning it.

mod builder;
mod iterator;
mod reader;

use std::path::PathBuf;

pub use builder::SSTableBuilder;
pub use iterator::SSTableIterator;
pub use reader::SSTableReader;

// =============================================================================
// Shared Constants (used by builder, reader)
// =============================================================================

/// Magic number identifying a TideKV segment file
pub const MAGIC: u32 = 123_456_789;

// =============================================================================
// SSTable Metadata
// =============================================================================

/// Segment metadata as recorded in its header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SSTable {
    /// Path to the segment file
    pub path: PathBuf,
    /// Number of records in the file
    pub entry_count: u32,
    /// Smallest key (for range filtering)
    pub min_key: Vec<u8>,
    /// Largest key (for range filtering)
    pub max_key: Vec<u8>,
    /// File size in bytes
    pub file_size: u64,
}

impl SSTable {
    /// Get the number of entries
    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    /// Range pre-check
    /// Returns false if key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        key >= self.min_key.as_slice() && key <= self.max_key.as_slice()
    }
}
