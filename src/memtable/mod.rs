//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Tombstones instead of physical removal
//! - Track size for flush triggers
//! - Ordered iteration for segment creation
//!
//! ## Data Structure Choice
//! BTreeMap keyed by raw bytes:
//! - Ascending key order, so the first and last entry of a flush are the
//!   segment's true min/max keys
//! - No internal locking: the engine's single lock guards the memtable
//!   together with the WAL and the segment counter

mod table;

pub use table::{MemTable, MemTableIter};

use crate::record::Operation;

/// Entry stored in the MemTable
///
/// A `Delete` keeps the value it replaced so a flush can still write a
/// complete tombstone record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemTableEntry {
    /// A live value
    Put(Vec<u8>),

    /// A tombstone (deleted key) carrying its previous value
    Delete(Vec<u8>),
}

impl MemTableEntry {
    /// The record operation this entry flushes as
    pub fn operation(&self) -> Operation {
        match self {
            MemTableEntry::Put(_) => Operation::Put,
            MemTableEntry::Delete(_) => Operation::Delete,
        }
    }

    /// The stored bytes (live value, or the value a tombstone replaced)
    pub fn value(&self) -> &[u8] {
        match self {
            MemTableEntry::Put(v) | MemTableEntry::Delete(v) => v,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, MemTableEntry::Delete(_))
    }
}

/// Outcome of a point lookup in the memtable or in one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Live value
    Found(Vec<u8>),

    /// Authoritatively deleted; older data must not be consulted
    Tombstone,

    /// No information about this key here
    Absent,
}

impl Lookup {
    /// True when this result ends a newest-first search
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Lookup::Absent)
    }
}
