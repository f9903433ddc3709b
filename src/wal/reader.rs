//! WAL Reader
//!
//! Lazily decodes records from a WAL file starting at a given offset.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::error::Result;
use crate::record::{self, Record};

use super::WATERMARK_SIZE;

/// Reads records from the WAL file
///
/// Yields `Err` once on a truncated or unknown record and then stops.
pub struct WalReader {
    reader: BufReader<File>,
    /// Offset of the next record
    position: u64,
    done: bool,
}

impl WalReader {
    /// Open a WAL file for reading from `from_offset`
    ///
    /// Offsets inside the watermark header are moved to the first record.
    pub fn open(path: &Path, from_offset: u64) -> Result<Self> {
        let start = from_offset.max(WATERMARK_SIZE);
        let mut reader = BufReader::new(File::open(path)?);
        reader.seek(SeekFrom::Start(start))?;

        Ok(Self {
            reader,
            position: start,
            done: false,
        })
    }

    /// Read the next record from the WAL
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        match record::decode(&mut self.reader)? {
            Some(record) => {
                self.position += record.encoded_len() as u64;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Offset of the next record to be read
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Iterator for WalReader {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
