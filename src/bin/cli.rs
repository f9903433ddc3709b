//! TideKV CLI Client
//!
//! Command-line interface for interacting with TideKV, remotely or
//! directly against a data directory.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tidekv::network::Client;
use tidekv::shell::Shell;
use tidekv::wal::WalRecovery;
use tidekv::{Engine, TideError};

/// TideKV CLI
#[derive(Parser, Debug)]
#[command(name = "tidekv-cli")]
#[command(about = "CLI for TideKV key-value store")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6380")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key (prints the removed value)
    Del {
        /// The key to delete
        key: String,
    },

    /// Ping the server
    Ping,

    /// Show engine counters
    Stats,

    /// Interactive shell against the server
    Shell,

    /// Interactive shell on a local data directory (no server)
    LocalShell {
        /// Data directory
        #[arg(short, long, default_value = "./tidekv_data")]
        data_dir: PathBuf,
    },

    /// Check a WAL file without modifying it
    VerifyWal {
        /// Path to wal.log
        path: PathBuf,
    },
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => {}
        Err(TideError::KeyNotFound) => {
            println!("Key not found");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    }
}

fn run(args: Args) -> tidekv::Result<()> {
    match args.command {
        Commands::Get { key } => {
            let value = Client::connect(&args.server)?.get(key.as_bytes())?;
            print_value(&value)
        }
        Commands::Set { key, value } => {
            Client::connect(&args.server)?.put(key.as_bytes(), value.as_bytes())?;
            println!("OK");
            Ok(())
        }
        Commands::Del { key } => {
            let value = Client::connect(&args.server)?.delete(key.as_bytes())?;
            print_value(&value)
        }
        Commands::Ping => {
            Client::connect(&args.server)?.ping()?;
            println!("PONG");
            Ok(())
        }
        Commands::Stats => {
            let stats = Client::connect(&args.server)?.stats()?;
            println!("memtable_entries: {}", stats.memtable_entries);
            println!("memtable_bytes:   {}", stats.memtable_bytes);
            println!("segment_count:    {}", stats.segment_count);
            println!("next_segment:     {}", stats.next_segment);
            println!("wal_size:         {}", stats.wal_size);
            println!("watermark:        {}", stats.watermark);
            Ok(())
        }
        Commands::Shell => {
            let client = Client::connect(&args.server)?;
            run_shell(client)
        }
        Commands::LocalShell { data_dir } => {
            let engine = Engine::open_path(&data_dir)?;
            run_shell(&engine)?;
            engine.close()
        }
        Commands::VerifyWal { path } => {
            let stats = WalRecovery::verify(&path)?;
            println!(
                "ok: {} unflushed record(s), watermark {}, size {}",
                stats.records_replayed, stats.watermark, stats.wal_size
            );
            Ok(())
        }
    }
}

fn run_shell<S: tidekv::shell::KvStore>(store: S) -> tidekv::Result<()> {
    let stdin = io::stdin();
    let input = stdin.lock();
    let output = io::stdout().lock();
    Shell::new(input, output, store).run()
}

fn print_value(value: &[u8]) -> tidekv::Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(value)?;
    writeln!(out)?;
    Ok(())
}
