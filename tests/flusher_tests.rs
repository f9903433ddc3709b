//! Tests for the background flush timer

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tidekv::config::Config;
use tidekv::engine::Engine;
use tidekv::flusher::FlushTimer;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine(interval: Option<Duration>) -> (TempDir, Arc<Engine>) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .flush_interval(interval)
        .build();
    let engine = Arc::new(Engine::open(config).unwrap());
    (temp_dir, engine)
}

/// Poll until `check` holds or the deadline passes
fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    check()
}

// =============================================================================
// Timer Tests
// =============================================================================

#[test]
fn test_timer_flushes_memtable() {
    let (_temp, engine) = setup_engine(Some(Duration::from_millis(50)));
    let timer = engine.start_flush_timer().unwrap().unwrap();
    assert_eq!(timer.interval(), Duration::from_millis(50));

    engine.put(b"k", b"v").unwrap();

    assert!(wait_for(Duration::from_secs(5), || engine.segment_count().unwrap() == 1));
    assert_eq!(engine.memtable_entry_count(), 0);
    assert_eq!(engine.get(b"k").unwrap(), b"v");

    timer.stop();
}

#[test]
fn test_timer_skips_empty_memtable() {
    let (_temp, engine) = setup_engine(None);
    let timer = FlushTimer::start(&engine, Duration::from_millis(20)).unwrap();

    thread::sleep(Duration::from_millis(150));

    assert_eq!(engine.segment_count().unwrap(), 0);
    timer.stop();
}

#[test]
fn test_timer_disabled_by_config() {
    let (_temp, engine) = setup_engine(None);

    assert!(engine.start_flush_timer().unwrap().is_none());
}

#[test]
fn test_timer_stop_is_prompt() {
    let (_temp, engine) = setup_engine(None);
    let timer = FlushTimer::start(&engine, Duration::from_secs(3600)).unwrap();

    let started = Instant::now();
    timer.stop();

    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_timer_exits_when_engine_dropped() {
    let (_temp, engine) = setup_engine(None);
    let timer = FlushTimer::start(&engine, Duration::from_millis(10)).unwrap();

    drop(engine);
    thread::sleep(Duration::from_millis(50));

    // Joins a thread that has already exited
    timer.stop();
}
