//! # TideKV
//!
//! A small log-structured key-value store with:
//! - Write-Ahead Logging (WAL) with a flush watermark
//! - Sorted in-memory MemTable flushed to immutable segment files
//! - Newest-first segment lookups with a key-range pre-check
//! - Crash recovery by WAL replay
//! - TCP client protocol and an interactive shell
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │        TCP Server        │   │     Interactive Shell    │
//! └────────────┬─────────────┘   └────────────┬─────────────┘
//!              └───────────────┬──────────────┘
//!                              │
//! ┌────────────────────────────▼────────────────────────────────┐
//! │                          Engine                             │
//! │                   (one exclusive lock)                      │
//! └────────────────────────────┬────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//!   ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//!   │     WAL     │     │  MemTable   │────▶│  Segments   │
//!   │  (Append)   │     │ (BTreeMap)  │flush│ (sst1, ...) │
//!   └─────────────┘     └─────────────┘     └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod wal;
pub mod memtable;
pub mod storage;
pub mod engine;
pub mod flusher;

pub mod protocol;
pub mod network;
pub mod shell;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, TideError};
pub use config::{Config, WalSyncStrategy};
pub use engine::{Engine, EngineStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of TideKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
