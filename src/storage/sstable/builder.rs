//! SSTable Builder
//!
//! Writes sorted records to a new segment file.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};

use crate::error::{Result, TideError};
use crate::memtable::MemTableEntry;
use crate::record::{self, Operation};

use super::{SSTable, MAGIC};

/// Builder for creating a new segment from sorted entries
///
/// Records are staged in memory; `finish()` writes the header (whose
/// min/max keys are only known once the last record is in) followed by the
/// records to `<path>.tmp`, fsyncs it, and renames it into place.
pub struct SSTableBuilder {
    /// Final segment path
    path: PathBuf,
    /// Encoded records
    body: BytesMut,
    /// Number of entries added
    entry_count: u32,
    /// First and last key added
    min_key: Option<Vec<u8>>,
    max_key: Option<Vec<u8>>,
}

impl SSTableBuilder {
    /// Create a new builder for `path`
    ///
    /// Nothing touches the disk until `finish()`.
    pub fn new(path: &Path) -> Result<Self> {
        if path.exists() {
            return Err(TideError::Storage(format!(
                "segment {} already exists",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            body: BytesMut::new(),
            entry_count: 0,
            min_key: None,
            max_key: None,
        })
    }

    /// Add a memtable entry (must be called in ascending key order)
    pub fn add_entry(&mut self, key: &[u8], entry: &MemTableEntry) -> Result<()> {
        self.add_record(entry.operation(), key, entry.value())
    }

    fn add_record(&mut self, op: Operation, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some(last) = &self.max_key {
            if key <= last.as_slice() {
                return Err(TideError::Storage(
                    "segment keys must be added in strictly ascending order".to_string(),
                ));
            }
        }
        if self.entry_count == u32::MAX {
            return Err(TideError::Storage(
                "segment entry count overflows u32".to_string(),
            ));
        }

        record::encode_into(&mut self.body, op, key, value)?;

        if self.min_key.is_none() {
            self.min_key = Some(key.to_vec());
        }
        self.max_key = Some(key.to_vec());
        self.entry_count += 1;

        Ok(())
    }

    /// Number of entries added so far
    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    /// Write the segment and return its metadata
    pub fn finish(self) -> Result<SSTable> {
        let (min_key, max_key) = match (self.min_key, self.max_key) {
            (Some(min), Some(max)) => (min, max),
            _ => {
                return Err(TideError::Storage(
                    "cannot write an empty segment".to_string(),
                ))
            }
        };

        let mut header = BytesMut::with_capacity(16 + min_key.len() + max_key.len());
        header.put_u32_le(MAGIC);
        header.put_u32_le(record::length_prefix("key", min_key.len())?);
        header.put_slice(&min_key);
        header.put_u32_le(record::length_prefix("key", max_key.len())?);
        header.put_slice(&max_key);
        header.put_u32_le(self.entry_count);

        let tmp_path = self.path.with_extension("tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&header)?;
        writer.write_all(&self.body)?;
        writer.flush()?;

        let file = writer.into_inner().map_err(|e| {
            TideError::Storage(format!("Failed to flush segment: {}", e))
        })?;
        file.sync_all()?;
        let file_size = file.metadata()?.len();
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        sync_parent_dir(&self.path)?;

        Ok(SSTable {
            path: self.path,
            entry_count: self.entry_count,
            min_key,
            max_key,
            file_size,
        })
    }
}

/// Make the rename itself durable
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        File::open(dir)?.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}
