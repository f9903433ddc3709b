//! MemTable implementation
//!
//! BTreeMap-based memtable. Callers provide the locking.

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::error::{Result, TideError};

use super::{Lookup, MemTableEntry};

/// In-memory table for recent writes
#[derive(Debug, Default)]
pub struct MemTable {
    data: BTreeMap<Vec<u8>, MemTableEntry>,
    /// Approximate size in bytes (keys + stored values)
    size: usize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a live value
    ///
    /// Returns the new approximate size.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> usize {
        self.insert(key, MemTableEntry::Put(value))
    }

    /// Tombstone a live key, returning the value it held
    ///
    /// Fails with `KeyNotFound` when the key is absent or already deleted.
    pub fn delete(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        let entry = self.data.get_mut(key).ok_or(TideError::KeyNotFound)?;
        if entry.is_tombstone() {
            return Err(TideError::KeyNotFound);
        }

        let previous = entry.value().to_vec();
        *entry = MemTableEntry::Delete(previous.clone());
        Ok(previous)
    }

    /// Install a tombstone unconditionally
    ///
    /// Used for keys whose live value sits in a segment, both on delete and
    /// on WAL replay, so the tombstone shadows the older segment.
    pub fn put_tombstone(&mut self, key: Vec<u8>, value: Vec<u8>) -> usize {
        self.insert(key, MemTableEntry::Delete(value))
    }

    fn insert(&mut self, key: Vec<u8>, entry: MemTableEntry) -> usize {
        let key_len = key.len();
        let value_len = entry.value().len();
        match self.data.insert(key, entry) {
            // Key bytes were already counted
            Some(old) => self.size = self.size - old.value().len() + value_len,
            None => self.size += key_len + value_len,
        }
        self.size
    }

    /// Look a key up
    pub fn get(&self, key: &[u8]) -> Lookup {
        match self.data.get(key) {
            Some(MemTableEntry::Put(value)) => Lookup::Found(value.clone()),
            Some(MemTableEntry::Delete(_)) => Lookup::Tombstone,
            None => Lookup::Absent,
        }
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of keys (tombstones included)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check whether either flush limit has been reached
    pub fn should_flush(&self, entry_limit: usize, size_limit: usize) -> bool {
        self.data.len() >= entry_limit || self.size >= size_limit
    }

    /// Entries in ascending key order (for flush)
    pub fn iter(&self) -> MemTableIter<'_> {
        MemTableIter {
            inner: self.data.iter(),
        }
    }

    /// Drop every entry (after a successful flush)
    pub fn clear(&mut self) {
        self.data = BTreeMap::new();
        self.size = 0;
    }
}

/// Iterator over MemTable entries in sorted key order
pub struct MemTableIter<'a> {
    inner: btree_map::Iter<'a, Vec<u8>, MemTableEntry>,
}

impl<'a> Iterator for MemTableIter<'a> {
    type Item = (&'a [u8], &'a MemTableEntry);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_slice(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> DoubleEndedIterator for MemTableIter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (k.as_slice(), v))
    }
}

impl<'a> ExactSizeIterator for MemTableIter<'a> {}
