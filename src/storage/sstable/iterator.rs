//! SSTable Iterator
//!
//! Sequential iteration over all records in a segment.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};

use crate::error::{Result, TideError};
use crate::record::{self, Record};

/// Iterator over segment records in file order
///
/// Yields exactly `entry_count` records; a file that ends early, or a
/// record that fails to decode, yields one `CorruptRecord` error and stops.
pub struct SSTableIterator<'a> {
    file: &'a mut BufReader<File>,
    /// Records still expected
    remaining: u32,
    /// Index of the next record (for error messages)
    index: u32,
    done: bool,
}

impl<'a> SSTableIterator<'a> {
    /// Create a new iterator starting at the first record
    pub(super) fn new(
        file: &'a mut BufReader<File>,
        data_offset: u64,
        entry_count: u32,
    ) -> Result<Self> {
        file.seek(SeekFrom::Start(data_offset))?;
        Ok(Self {
            file,
            remaining: entry_count,
            index: 0,
            done: false,
        })
    }
}

impl<'a> Iterator for SSTableIterator<'a> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.remaining == 0 {
            return None;
        }

        let item = match record::decode(&mut *self.file) {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(TideError::CorruptRecord(format!(
                "segment ended after {} records, header promised {}",
                self.index,
                self.index + self.remaining
            ))),
            Err(e) => Err(e),
        };

        if item.is_err() {
            self.done = true;
        } else {
            self.remaining -= 1;
            self.index += 1;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, Some(self.remaining as usize))
        }
    }
}
