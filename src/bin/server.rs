//! TideKV Server Binary
//!
//! Starts the TCP server for TideKV.

use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tidekv::network::Server;
use tidekv::{Config, Engine, WalSyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// TideKV Server
#[derive(Parser, Debug)]
#[command(name = "tidekv-server")]
#[command(about = "Log-structured key-value store server")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./tidekv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6380")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// MemTable entry count before flush
    #[arg(short = 'e', long, default_value = "1000")]
    memtable_entries: usize,

    /// MemTable size limit in MB before flush
    #[arg(short = 'm', long, default_value = "4")]
    memtable_mb: usize,

    /// Seconds between timer flushes (0 disables the timer)
    #[arg(short = 'f', long, default_value = "15")]
    flush_interval: u64,

    /// fsync the WAL after every write
    #[arg(long)]
    sync_every_write: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tidekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("TideKV Server v{}", tidekv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    if let Err(e) = run(args) {
        tracing::error!("Server error: {}", e);
        process::exit(1);
    }

    tracing::info!("Server stopped");
}

fn run(args: Args) -> tidekv::Result<()> {
    let mut builder = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .memtable_entry_limit(args.memtable_entries)
        .memtable_size_limit(args.memtable_mb * 1024 * 1024)
        .flush_interval((args.flush_interval > 0).then(|| Duration::from_secs(args.flush_interval)));

    if args.sync_every_write {
        builder = builder.wal_sync_strategy(WalSyncStrategy::EveryWrite);
    }
    let config = builder.build();

    let engine = Arc::new(Engine::open(config.clone())?);
    tracing::info!("Engine initialized successfully");

    let timer = engine.start_flush_timer()?;

    let server = Server::bind(config, Arc::clone(&engine))?;
    let result = server.run();

    if let Some(timer) = timer {
        timer.stop();
    }
    engine.close()?;
    result
}
