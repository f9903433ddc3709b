//! Storage Module
//!
//! Persistent storage layer: numbered, immutable segment files.
//!
//! ## Responsibilities
//! - Persist flushed memtables to disk in sorted format
//! - Range-checked point lookups, newest segment first
//! - Segment numbering from the files present on disk
//!
//! ## Layout
//! ```text
//! {data_dir}/segments/
//!   ├── sst1      (oldest)
//!   ├── sst2
//!   └── sstN      (newest, shadows everything below it)
//! ```
//!
//! There is no compaction: segments accumulate until removed by hand.

mod sstable;
mod manager;

pub use sstable::{SSTable, SSTableBuilder, SSTableIterator, SSTableReader, MAGIC};
pub use manager::StorageManager;
