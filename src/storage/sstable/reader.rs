//! SSTable Reader
//!
//! Opens a segment, parses its header, and answers point lookups by a
//! linear scan guarded by the header's key range.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, TideError};
use crate::memtable::Lookup;
use crate::record::{self, Operation};

use super::iterator::SSTableIterator;
use super::{SSTable, MAGIC};

/// Reader for one segment file
///
/// Owns the file handle; dropping the reader closes the file.
pub struct SSTableReader {
    file: BufReader<File>,
    /// Header contents
    meta: SSTable,
    /// Offset of the first record
    data_offset: u64,
}

impl SSTableReader {
    /// Open a segment and parse its header
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut file = BufReader::new(file);

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic).map_err(|_| {
            TideError::CorruptRecord(format!("{}: truncated segment header", path.display()))
        })?;
        let magic = u32::from_le_bytes(magic);
        if magic != MAGIC {
            return Err(TideError::CorruptRecord(format!(
                "{}: invalid segment magic {} (expected {})",
                path.display(),
                magic,
                MAGIC
            )));
        }

        let min_len = record::read_u32_le(&mut file, "segment min key length")?;
        let min_key = record::read_bytes(&mut file, min_len, "segment min key")?;
        let max_len = record::read_u32_le(&mut file, "segment max key length")?;
        let max_key = record::read_bytes(&mut file, max_len, "segment max key")?;
        let entry_count = record::read_u32_le(&mut file, "segment entry count")?;

        let data_offset = 4 + 4 + u64::from(min_len) + 4 + u64::from(max_len) + 4;

        Ok(Self {
            file,
            meta: SSTable {
                path: path.to_path_buf(),
                entry_count,
                min_key,
                max_key,
                file_size,
            },
            data_offset,
        })
    }

    /// Look a key up
    ///
    /// Skips the scan entirely when the key is outside `[min_key, max_key]`.
    /// Otherwise reads every record; the last one with a matching key wins.
    pub fn get(&mut self, key: &[u8]) -> Result<Lookup> {
        if !self.might_contain(key) {
            return Ok(Lookup::Absent);
        }

        let mut result = Lookup::Absent;
        for record in self.iter()? {
            let record = record?;
            if record.key == key {
                result = match record.op {
                    Operation::Put => Lookup::Found(record.value),
                    Operation::Delete => Lookup::Tombstone,
                };
            }
        }

        Ok(result)
    }

    /// Header metadata
    pub fn metadata(&self) -> &SSTable {
        &self.meta
    }

    /// Get entry count
    pub fn entry_count(&self) -> u32 {
        self.meta.entry_count
    }

    pub fn min_key(&self) -> &[u8] {
        &self.meta.min_key
    }

    pub fn max_key(&self) -> &[u8] {
        &self.meta.max_key
    }

    /// Quick check if a key might be in this segment (range check)
    pub fn might_contain(&self, key: &[u8]) -> bool {
        self.meta.might_contain(key)
    }

    /// Create an iterator over all records
    pub fn iter(&mut self) -> Result<SSTableIterator<'_>> {
        SSTableIterator::new(&mut self.file, self.data_offset, self.meta.entry_count)
    }
}
