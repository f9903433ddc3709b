//! Crash recovery tests
//!
//! A "crash" is simulated by dropping the engine without `close()`, so the
//! memtable is lost and only the WAL and segments remain.
//!
//! These tests verify:
//! - Unflushed writes come back from the WAL
//! - Flushed writes are not replayed twice
//! - Deletes of on-disk keys survive a crash
//! - A damaged WAL tail refuses to open

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tidekv::config::{Config, WalSyncStrategy};
use tidekv::engine::Engine;
use tidekv::TideError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_engine(path: &Path) -> Engine {
    let config = Config::builder()
        .data_dir(path)
        .wal_sync_strategy(WalSyncStrategy::EveryWrite)
        .memtable_entry_limit(10_000)
        .build();
    Engine::open(config).unwrap()
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_recover_unflushed_puts() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = open_engine(temp_dir.path());
        for i in 0..100 {
            engine
                .put(format!("key{}", i).as_bytes(), format!("value{}", i).as_bytes())
                .unwrap();
        }
        // Crash: no close()
    }

    let engine = open_engine(temp_dir.path());
    assert_eq!(engine.memtable_entry_count(), 100);
    assert_eq!(engine.segment_count().unwrap(), 0);
    for i in 0..100 {
        assert_eq!(
            engine.get(format!("key{}", i).as_bytes()).unwrap(),
            format!("value{}", i).as_bytes()
        );
    }
}

#[test]
fn test_recover_only_past_watermark() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = open_engine(temp_dir.path());
        engine.put(b"flushed", b"1").unwrap();
        engine.flush().unwrap();
        engine.put(b"pending", b"2").unwrap();
    }

    let engine = open_engine(temp_dir.path());
    assert_eq!(engine.memtable_entry_count(), 1);
    assert_eq!(engine.get(b"flushed").unwrap(), b"1");
    assert_eq!(engine.get(b"pending").unwrap(), b"2");
}

#[test]
fn test_recover_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = open_engine(temp_dir.path());
        engine.put(b"a", b"1").unwrap();
        engine.put(b"b", b"2").unwrap();
        engine.delete(b"a").unwrap();
    }

    let engine = open_engine(temp_dir.path());
    let before = engine.stats().unwrap();

    let again = engine.recover().unwrap();
    assert_eq!(again.records_replayed, 3);
    assert_eq!(engine.stats().unwrap(), before);
    assert!(matches!(engine.get(b"a"), Err(TideError::KeyNotFound)));
    assert_eq!(engine.get(b"b").unwrap(), b"2");
}

#[test]
fn test_recover_delete_of_segment_key() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = open_engine(temp_dir.path());
        engine.put(b"key", b"on-disk").unwrap();
        engine.flush().unwrap();
        engine.delete(b"key").unwrap();
    }

    let engine = open_engine(temp_dir.path());
    assert!(matches!(engine.get(b"key"), Err(TideError::KeyNotFound)));

    // And stays deleted once the recovered tombstone is flushed
    engine.flush().unwrap();
    drop(engine);
    let engine = open_engine(temp_dir.path());
    assert!(matches!(engine.get(b"key"), Err(TideError::KeyNotFound)));
}

#[test]
fn test_recover_twice_across_reopens() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = open_engine(temp_dir.path());
        engine.put(b"k", b"v").unwrap();
    }
    {
        let engine = open_engine(temp_dir.path());
        engine.put(b"k2", b"v2").unwrap();
    }

    let engine = open_engine(temp_dir.path());
    assert_eq!(engine.get(b"k").unwrap(), b"v");
    assert_eq!(engine.get(b"k2").unwrap(), b"v2");
}

#[test]
fn test_recover_after_close_has_nothing_to_replay() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = open_engine(temp_dir.path());
        engine.put(b"k", b"v").unwrap();
        engine.close().unwrap();
    }

    let engine = open_engine(temp_dir.path());
    assert_eq!(engine.recover().unwrap().records_replayed, 0);
    assert_eq!(engine.get(b"k").unwrap(), b"v");
}

#[test]
fn test_recover_stale_temp_segment_removed() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = open_engine(temp_dir.path());
        engine.put(b"k", b"v").unwrap();
    }
    // A flush that crashed before its rename
    std::fs::write(temp_dir.path().join("segments").join("sst1.tmp"), b"junk").unwrap();

    let engine = open_engine(temp_dir.path());
    assert!(!temp_dir.path().join("segments").join("sst1.tmp").exists());
    engine.flush().unwrap();
    assert_eq!(engine.get(b"k").unwrap(), b"v");
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_recover_corrupt_tail_is_fatal() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = open_engine(temp_dir.path());
        engine.put(b"k", b"v").unwrap();
    }

    let wal_path = temp_dir.path().join("wal.log");
    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[0x00, 3, 0, 0, 0, b'a']).unwrap();
    drop(file);

    let config = Config::builder().data_dir(temp_dir.path()).build();
    assert!(matches!(Engine::open(config), Err(TideError::CorruptRecord(_))));
}

#[test]
fn test_recover_truncated_watermark_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("wal.log"), [0u8; 5]).unwrap();

    let config = Config::builder().data_dir(temp_dir.path()).build();
    assert!(matches!(Engine::open(config), Err(TideError::CorruptRecord(_))));
}
