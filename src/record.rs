//! Record codec
//!
//! Encoding and decoding of the single log record shared by the WAL and
//! segment files.
//!
//! ## Record Format
//! ```text
//! ┌────────┬──────────────┬───────┬──────────────┬─────────┐
//! │ Op (1) │ KeyLen (4 LE)│  Key  │ ValLen (4 LE)│  Value  │
//! └────────┴──────────────┴───────┴──────────────┴─────────┘
//! ```
//!
//! - Op `0x00` = Put, `0x01` = Delete (tombstone)
//! - A Delete record still carries the value that was deleted

use std::io::{self, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, TideError};

/// Fixed overhead of one record: op (1) + key_len (4) + value_len (4)
pub const RECORD_OVERHEAD: usize = 9;

/// Operation tag stored in front of every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Operation {
    Put = 0x00,
    Delete = 0x01,
}

impl Operation {
    /// Wire byte for this operation
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parse a wire byte
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(Operation::Put),
            0x01 => Ok(Operation::Delete),
            other => Err(TideError::CorruptRecord(format!(
                "unknown operation byte 0x{:02x}",
                other
            ))),
        }
    }
}

/// A decoded `(operation, key, value)` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub op: Operation,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Record {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            op: Operation::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            op: Operation::Delete,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Size of this record once encoded
    pub fn encoded_len(&self) -> usize {
        RECORD_OVERHEAD + self.key.len() + self.value.len()
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode one record into a fresh buffer
pub fn encode(op: Operation, key: &[u8], value: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(RECORD_OVERHEAD + key.len() + value.len());
    encode_into(&mut buf, op, key, value)?;
    Ok(buf.freeze())
}

/// Append one encoded record to `buf`
///
/// Lengths are validated before anything is written, so a rejected record
/// leaves `buf` untouched.
pub fn encode_into(buf: &mut BytesMut, op: Operation, key: &[u8], value: &[u8]) -> Result<()> {
    let key_len = length_prefix("key", key.len())?;
    let value_len = length_prefix("value", value.len())?;

    buf.reserve(RECORD_OVERHEAD + key.len() + value.len());
    buf.put_u8(op.as_byte());
    buf.put_u32_le(key_len);
    buf.put_slice(key);
    buf.put_u32_le(value_len);
    buf.put_slice(value);
    Ok(())
}

/// Convert a field length to its 32-bit prefix
pub(crate) fn length_prefix(field: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| TideError::RecordTooLarge { field, len })
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode the next record from a stream
///
/// Returns:
/// - `Ok(Some(record))`: a complete record
/// - `Ok(None)`: clean end of stream (no byte before the op byte)
/// - `Err(CorruptRecord)`: the stream ended part-way through a record,
///   or the op byte is unknown
pub fn decode<R: Read>(reader: &mut R) -> Result<Option<Record>> {
    let mut op_byte = [0u8; 1];
    loop {
        match reader.read(&mut op_byte) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    let op = Operation::from_byte(op_byte[0])?;

    let key_len = read_u32_le(reader, "key length")?;
    let key = read_bytes(reader, key_len, "key")?;
    let value_len = read_u32_le(reader, "value length")?;
    let value = read_bytes(reader, value_len, "value")?;

    Ok(Some(Record { op, key, value }))
}

/// Read a little-endian u32, mapping a short read to corruption
pub(crate) fn read_u32_le<R: Read>(reader: &mut R, what: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| truncated(e, what))?;
    Ok(u32::from_le_bytes(buf))
}

/// Read exactly `len` bytes, mapping a short read to corruption
///
/// Reads through `take` so a garbage length cannot force a huge allocation
/// up front.
pub(crate) fn read_bytes<R: Read>(reader: &mut R, len: u32, what: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity((len as usize).min(64 * 1024));
    reader.by_ref().take(u64::from(len)).read_to_end(&mut buf)?;
    if buf.len() != len as usize {
        return Err(TideError::CorruptRecord(format!(
            "truncated {}: expected {} bytes, got {}",
            what,
            len,
            buf.len()
        )));
    }
    Ok(buf)
}

fn truncated(err: io::Error, what: &str) -> TideError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        TideError::CorruptRecord(format!("truncated {}", what))
    } else {
        TideError::Io(err)
    }
}
