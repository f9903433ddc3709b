//! Benchmarks for TideKV storage operations

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;
use tidekv::config::{Config, WalSyncStrategy};
use tidekv::engine::Engine;
use tidekv::memtable::MemTable;
use tidekv::storage::StorageManager;

const KEY_COUNT: usize = 1000;

fn key(i: usize) -> Vec<u8> {
    format!("key{:06}", i).into_bytes()
}

fn open_engine(dir: &TempDir) -> Engine {
    let config = Config::builder()
        .data_dir(dir.path())
        .wal_sync_strategy(WalSyncStrategy::EveryNEntries { count: 1000 })
        .memtable_entry_limit(100_000)
        .flush_interval(None)
        .build();
    Engine::open(config).unwrap()
}

fn engine_benchmarks(c: &mut Criterion) {
    c.bench_function("engine_put", |b| {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);
        let mut i = 0usize;
        b.iter(|| {
            engine.put(&key(i), b"value-bytes-0123456789").unwrap();
            i += 1;
        });
    });

    c.bench_function("engine_get_memtable", |b| {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);
        for i in 0..KEY_COUNT {
            engine.put(&key(i), b"value").unwrap();
        }
        let mut i = 0usize;
        b.iter(|| {
            black_box(engine.get(&key(i % KEY_COUNT)).unwrap());
            i += 1;
        });
    });

    c.bench_function("engine_get_segment", |b| {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);
        for i in 0..KEY_COUNT {
            engine.put(&key(i), b"value").unwrap();
        }
        engine.flush().unwrap();
        let mut i = 0usize;
        b.iter(|| {
            black_box(engine.get(&key(i % KEY_COUNT)).unwrap());
            i += 1;
        });
    });
}

fn segment_benchmarks(c: &mut Criterion) {
    let mut memtable = MemTable::new();
    for i in 0..KEY_COUNT {
        memtable.put(key(i), b"value".to_vec());
    }

    c.bench_function("segment_write_1k", |b| {
        b.iter_batched(
            || {
                let dir = TempDir::new().unwrap();
                let storage = StorageManager::open(dir.path()).unwrap();
                (dir, storage)
            },
            |(_dir, storage)| {
                storage.write_segment(1, &memtable).unwrap();
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("segment_lookup_out_of_range", |b| {
        let dir = TempDir::new().unwrap();
        let storage = StorageManager::open(dir.path()).unwrap();
        storage.write_segment(1, &memtable).unwrap();
        b.iter(|| black_box(storage.get(b"zzz").unwrap()));
    });
}

criterion_group!(benches, engine_benchmarks, segment_benchmarks);
criterion_main!(benches);
