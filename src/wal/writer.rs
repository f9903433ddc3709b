//! WAL Writer
//!
//! Handles appending records and maintaining the watermark.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{Result, TideError};
use crate::record::{self, Operation};

use super::{WalReader, WATERMARK_SIZE};

/// Writes records to the WAL file
///
/// Takes `&mut self` for every mutation, so the owner's lock is what keeps
/// concurrent appends from interleaving.
pub struct WalWriter {
    path: PathBuf,
    file: File,
    /// Offset one past the last complete record
    end_offset: u64,
    /// Cached copy of the on-disk watermark
    watermark: u64,
    sync_strategy: WalSyncStrategy,
    /// Appends since the last fsync
    unsynced: usize,
    /// A failed append left bytes past `end_offset` that are not yet cut off
    torn_tail: bool,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// A new file gets a zero watermark. An existing file must be at least
    /// as long as its header and its watermark must not point past the end.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let mut len = file.metadata()?.len();
        if len == 0 {
            file.write_all(&0u64.to_le_bytes())?;
            file.sync_all()?;
            len = WATERMARK_SIZE;
            tracing::debug!(path = %path.display(), "created new WAL");
        } else if len < WATERMARK_SIZE {
            return Err(TideError::CorruptRecord(format!(
                "WAL {} is {} bytes, shorter than its {}-byte watermark header",
                path.display(),
                len,
                WATERMARK_SIZE
            )));
        }

        let watermark = read_watermark_from(&mut file)?;
        if watermark > len {
            return Err(TideError::CorruptRecord(format!(
                "WAL watermark {} is past end of file ({} bytes)",
                watermark, len
            )));
        }

        file.seek(SeekFrom::Start(len))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            end_offset: len,
            watermark,
            sync_strategy,
            unsynced: 0,
            torn_tail: false,
        })
    }

    /// Append one record, returning the new end-of-file offset
    pub fn append(&mut self, op: Operation, key: &[u8], value: &[u8]) -> Result<u64> {
        let bytes = record::encode(op, key, value)?;
        self.repair_tail()?;

        self.file.seek(SeekFrom::Start(self.end_offset))?;
        if let Err(e) = self.file.write_all(&bytes) {
            // Drop whatever part of the record made it out so the next
            // append starts on a record boundary.
            if let Err(truncate_err) = self.file.set_len(self.end_offset) {
                tracing::error!(
                    offset = self.end_offset,
                    error = %truncate_err,
                    "Failed to truncate partial WAL record, will retry before next write"
                );
                self.torn_tail = true;
            }
            return Err(e.into());
        }
        self.end_offset += bytes.len() as u64;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync()?;
        }

        Ok(self.end_offset)
    }

    /// Read the watermark from disk
    pub fn read_watermark(&mut self) -> Result<u64> {
        let watermark = read_watermark_from(&mut self.file)?;
        self.file.seek(SeekFrom::Start(self.end_offset))?;
        Ok(watermark)
    }

    /// Overwrite the watermark (always fsynced)
    ///
    /// Everything before `offset` must already be durable in a segment.
    pub fn set_watermark(&mut self, offset: u64) -> Result<()> {
        if offset > self.end_offset {
            return Err(TideError::CorruptRecord(format!(
                "watermark {} would point past end of WAL ({})",
                offset, self.end_offset
            )));
        }

        self.repair_tail()?;
        // Records up to `offset` must hit the disk before the watermark does
        self.sync()?;

        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&offset.to_le_bytes())?;
        self.file.sync_data()?;
        self.file.seek(SeekFrom::Start(self.end_offset))?;

        self.watermark = offset;
        Ok(())
    }

    /// Replay records from the watermark to the current end of file
    pub fn replay(&self) -> Result<WalReader> {
        self.replay_from(self.watermark)
    }

    /// Replay records starting at an arbitrary offset
    pub fn replay_from(&self, offset: u64) -> Result<WalReader> {
        WalReader::open(&self.path, offset)
    }

    /// Cut off bytes left behind by an append whose truncate failed
    fn repair_tail(&mut self) -> Result<()> {
        if self.torn_tail {
            self.file.set_len(self.end_offset)?;
            self.file.sync_data()?;
            self.torn_tail = false;
            tracing::info!(offset = self.end_offset, "Truncated partial WAL record");
        }
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        if self.unsynced > 0 {
            self.file.sync_data()?;
            self.unsynced = 0;
        }
        Ok(())
    }

    /// Current end-of-file offset (the WAL size)
    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }

    /// Last watermark written or read
    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    /// True when records exist past the watermark
    pub fn has_unflushed(&self) -> bool {
        self.watermark.max(WATERMARK_SIZE) < self.end_offset
    }

    /// Swap in a read-only handle so every write fails
    #[cfg(test)]
    pub(crate) fn reopen_read_only(&mut self) -> Result<()> {
        self.file = File::open(&self.path)?;
        Ok(())
    }
}

pub(super) fn read_watermark_from(file: &mut File) -> Result<u64> {
    let mut buf = [0u8; WATERMARK_SIZE as usize];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            TideError::CorruptRecord("truncated WAL watermark".to_string())
        } else {
            TideError::Io(e)
        }
    })?;
    Ok(u64::from_le_bytes(buf))
}
