//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and segment storage
//! - Serialize all access behind one lock
//! - Trigger flushes when the MemTable is full
//! - Replay the WAL on startup

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, TideError};
use crate::flusher::FlushTimer;
use crate::memtable::{Lookup, MemTable};
use crate::protocol::Command;
use crate::record::Operation;
use crate::storage::StorageManager;
use crate::wal::{RecoveryStats, WalRecovery, WalWriter};

/// The main storage engine
///
/// ## Concurrency Model: one exclusive lock
///
/// `state` holds the memtable, the WAL writer and the segment counter.
/// Every operation (put, get, delete, flush, recovery) holds the lock for
/// its full duration, including segment scans. A flush clears the memtable
/// in place, so a reader running alongside it could otherwise miss a key
/// that is halfway into a new segment.
///
/// Share the engine between threads with `Arc<Engine>`.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Directory holding the segment files
    storage_dir: PathBuf,

    /// Path of the write-ahead log
    wal_path: PathBuf,

    /// Segment directory access (stateless)
    storage: StorageManager,

    /// Everything the lock protects
    state: Mutex<EngineState>,
}

/// State guarded by the engine lock
struct EngineState {
    memtable: MemTable,
    wal: WalWriter,
    /// Number the next flushed segment gets
    next_segment: u64,
}

/// Point-in-time engine counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Keys in the memtable (tombstones included)
    pub memtable_entries: u64,
    /// Approximate memtable bytes
    pub memtable_bytes: u64,
    /// Segment files on disk
    pub segment_count: u64,
    /// Number the next segment will get
    pub next_segment: u64,
    /// WAL size in bytes
    pub wal_size: u64,
    /// WAL watermark
    pub watermark: u64,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SEGMENT_DIR: &'static str = "segments";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data and segment directories
    /// 2. Open (or create) the WAL
    /// 3. Seed the segment counter from the segment files on disk
    /// 4. Replay unflushed WAL records into the memtable
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.data_dir)?;
        let storage_dir = config.data_dir.join(Self::SEGMENT_DIR);
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        let storage = StorageManager::open(&storage_dir)?;
        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;
        let next_segment = storage.next_segment_id()?;

        let engine = Self {
            config,
            storage_dir,
            wal_path,
            storage,
            state: Mutex::new(EngineState {
                memtable: MemTable::new(),
                wal,
                next_segment,
            }),
        };

        let stats = engine.recover()?;
        tracing::info!(
            data_dir = %engine.config.data_dir.display(),
            next_segment,
            replayed = stats.records_replayed,
            "engine opened"
        );

        Ok(engine)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Replay WAL records past the watermark into the memtable
    ///
    /// Runs once from `open`; calling it again against an unchanged WAL
    /// leaves the memtable as it was.
    pub fn recover(&self) -> Result<RecoveryStats> {
        let mut state = self.state.lock();
        let state = &mut *state;

        let stats = WalRecovery::replay_into(&state.wal, &mut state.memtable)?;
        if stats.records_replayed > 0 {
            tracing::info!(
                records = stats.records_replayed,
                watermark = stats.watermark,
                wal_size = stats.wal_size,
                "replayed WAL"
            );
        }
        Ok(stats)
    }

    /// Execute a command
    ///
    /// Routes protocol commands to the matching operation
    pub fn execute(&self, command: Command) -> Result<Option<Vec<u8>>> {
        match command {
            Command::Get { key } => self.get(&key).map(Some),
            Command::Put { key, value } => {
                self.put(&key, &value)?;
                Ok(None)
            }
            Command::Delete { key } => self.delete(&key).map(Some),
            Command::Ping => Ok(Some(b"PONG".to_vec())),
            Command::Stats => Ok(Some(bincode::serialize(&self.stats()?)?)),
        }
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (a tombstone here ends the search)
    /// 2. Segments, newest to oldest
    ///
    /// Returns `KeyNotFound` when the key is absent or deleted.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let state = self.state.lock();
        match self.lookup_locked(&state, key)? {
            Lookup::Found(value) => Ok(value),
            Lookup::Tombstone | Lookup::Absent => Err(TideError::KeyNotFound),
        }
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Acquire the engine lock
    /// 2. Append to the WAL (nothing changes if this fails)
    /// 3. Write to the MemTable
    /// 4. Flush if a limit is reached
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut state = self.state.lock();

        state.wal.append(Operation::Put, key, value)?;
        state.memtable.put(key.to_vec(), value.to_vec());

        self.maybe_flush_locked(&mut state)?;
        Ok(())
    }

    /// Delete a key, returning the value it held
    ///
    /// The key must currently resolve to a value. A key that lives only in
    /// a segment gets a tombstone entry in the memtable; the WAL gets a
    /// single Delete record carrying the deleted value. Nothing changes if
    /// the WAL append fails.
    pub fn delete(&self, key: &[u8]) -> Result<Vec<u8>> {
        let mut state = self.state.lock();

        let (previous, in_memtable) = match state.memtable.get(key) {
            Lookup::Found(value) => (value, true),
            Lookup::Tombstone => return Err(TideError::KeyNotFound),
            Lookup::Absent => match self.storage.get(key)? {
                Lookup::Found(value) => (value, false),
                Lookup::Tombstone | Lookup::Absent => return Err(TideError::KeyNotFound),
            },
        };

        state.wal.append(Operation::Delete, key, &previous)?;
        if in_memtable {
            state.memtable.delete(key)?;
        } else {
            state.memtable.put_tombstone(key.to_vec(), previous.clone());
        }

        self.maybe_flush_locked(&mut state)?;
        Ok(previous)
    }

    /// Flush memtable to a new segment (public API)
    ///
    /// Forces a flush regardless of memtable size. Returns `false` when
    /// there was nothing to flush.
    pub fn flush(&self) -> Result<bool> {
        let mut state = self.state.lock();
        self.flush_locked(&mut state)
    }

    /// Flush only if the memtable has reached a configured limit
    pub fn maybe_flush(&self) -> Result<bool> {
        let mut state = self.state.lock();
        self.maybe_flush_locked(&mut state)
    }

    fn maybe_flush_locked(&self, state: &mut MutexGuard<'_, EngineState>) -> Result<bool> {
        let full = state.memtable.should_flush(
            self.config.memtable_entry_limit,
            self.config.memtable_size_limit,
        );
        if full {
            self.flush_locked(state)
        } else {
            Ok(false)
        }
    }

    /// Internal flush implementation (called with the lock held)
    ///
    /// Order matters for crash safety: the segment is durable before the
    /// watermark moves, and the watermark moves before the memtable is
    /// dropped. A crash in between only causes records to be replayed into
    /// a later segment, never lost.
    fn flush_locked(&self, state: &mut MutexGuard<'_, EngineState>) -> Result<bool> {
        if state.memtable.is_empty() {
            return Ok(false);
        }

        let id = state.next_segment;
        let sstable = self.storage.write_segment(id, &state.memtable)?;
        state.next_segment += 1;

        let end = state.wal.end_offset();
        state.wal.set_watermark(end)?;

        state.memtable.clear();

        tracing::info!(
            segment = id,
            entries = sstable.entry_count,
            bytes = sstable.file_size,
            watermark = end,
            "flushed memtable"
        );
        Ok(true)
    }

    /// Memtable first, then segments newest-first
    fn lookup_locked(&self, state: &EngineState, key: &[u8]) -> Result<Lookup> {
        match state.memtable.get(key) {
            Lookup::Absent => self.storage.get(key),
            resolved => Ok(resolved),
        }
    }

    /// Start the background flush timer if the config asks for one
    pub fn start_flush_timer(self: &Arc<Self>) -> Result<Option<FlushTimer>> {
        match self.config.flush_interval {
            Some(interval) => FlushTimer::start(self, interval).map(Some),
            None => Ok(None),
        }
    }

    /// Close the engine gracefully
    ///
    /// Flushes any pending data and syncs the WAL
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.flush_locked(&mut state)?;
        state.wal.sync()?;
        tracing::info!("engine closed");
        Ok(())
    }

    /// Snapshot of the engine counters
    pub fn stats(&self) -> Result<EngineStats> {
        let state = self.state.lock();
        Ok(EngineStats {
            memtable_entries: state.memtable.len() as u64,
            memtable_bytes: state.memtable.size() as u64,
            segment_count: self.storage.count_segments()? as u64,
            next_segment: state.next_segment,
            wal_size: state.wal.end_offset(),
            watermark: state.wal.watermark(),
        })
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the segment directory path
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Get the WAL path
    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.state.lock().memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.state.lock().memtable.len()
    }

    /// Get the number of segments on disk
    pub fn segment_count(&self) -> Result<usize> {
        let _state = self.state.lock();
        self.storage.count_segments()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_delete_of_segment_key_changes_nothing_when_wal_fails() {
        let temp = TempDir::new().unwrap();
        let engine = Engine::open_path(temp.path()).unwrap();
        engine.put(b"k", b"v").unwrap();
        engine.flush().unwrap();

        engine.state.lock().wal.reopen_read_only().unwrap();

        assert!(matches!(engine.delete(b"k"), Err(TideError::Io(_))));
        assert_eq!(engine.memtable_entry_count(), 0);
        assert_eq!(engine.memtable_size(), 0);
        assert_eq!(engine.get(b"k").unwrap(), b"v");
    }

    #[test]
    fn test_delete_of_memtable_key_changes_nothing_when_wal_fails() {
        let temp = TempDir::new().unwrap();
        let engine = Engine::open_path(temp.path()).unwrap();
        engine.put(b"k", b"v").unwrap();

        engine.state.lock().wal.reopen_read_only().unwrap();

        assert!(engine.delete(b"k").is_err());
        assert_eq!(engine.memtable_entry_count(), 1);
        assert_eq!(engine.get(b"k").unwrap(), b"v");
    }
}
