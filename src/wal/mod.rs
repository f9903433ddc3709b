//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append a record for every mutation before it is acknowledged
//! - Track the watermark: the offset up to which records already live in
//!   a flushed segment
//! - Replay unflushed records on startup
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Watermark: u64 LE (8)                   │
//! ├─────────────────────────────────────────┤
//! │ Record 1                                │
//! │ ┌────────┬─────────┬─────┬─────────┬───┐│
//! │ │ Op (1) │KeyLen(4)│ Key │ValLen(4)│Val││
//! │ └────────┴─────────┴─────┴─────────┴───┘│
//! ├─────────────────────────────────────────┤
//! │ Record 2 ...                            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Invariant: `0 <= watermark <= file size`. A watermark below the header
//! size means nothing has been flushed yet.

mod writer;
mod reader;
mod recovery;

pub use writer::WalWriter;
pub use reader::WalReader;
pub use recovery::{RecoveryStats, WalRecovery};

/// Size of the watermark header at offset 0
pub const WATERMARK_SIZE: u64 = 8;
