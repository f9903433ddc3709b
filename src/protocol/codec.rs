//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - GET:    key_len (4 bytes) + key
//! - PUT:    key_len (4 bytes) + key + value
//! - DELETE: key_len (4 bytes) + key
//! - PING:   empty
//! - STATS:  empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! All protocol integers are big-endian (unlike the on-disk formats).

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, TideError};

use super::{Command, CommandType, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Framing
// =============================================================================

/// Build `[tag][len][payload]`, rejecting oversized payloads
fn frame(tag: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(TideError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(tag);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    Ok(message.to_vec())
}

/// Split a complete message into `(tag, payload)`
fn unframe<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(TideError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let tag = header.get_u8();
    let payload_len = check_payload_len(header.get_u32(), what)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(TideError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((tag, &bytes[HEADER_SIZE..total_len]))
}

fn check_payload_len(len: u32, what: &str) -> Result<usize> {
    if len > MAX_PAYLOAD_SIZE {
        return Err(TideError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(len as usize)
}

/// Read one framed message from a stream (blocking)
fn read_frame<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = check_payload_len(
        u32::from_be_bytes([header[1], header[2], header[3], header[4]]),
        what,
    )?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut message[HEADER_SIZE..])?;
    Ok(message)
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let mut payload = BytesMut::new();
    match command {
        Command::Get { key } | Command::Delete { key } => put_key(&mut payload, key)?,
        Command::Put { key, value } => {
            put_key(&mut payload, key)?;
            payload.put_slice(value);
        }
        Command::Ping | Command::Stats => {}
    }

    frame(command.command_type() as u8, &payload)
}

fn put_key(payload: &mut BytesMut, key: &[u8]) -> Result<()> {
    let key_len = u32::try_from(key.len()).map_err(|_| {
        TideError::Protocol(format!("Key too large: {} bytes", key.len()))
    })?;
    payload.put_u32(key_len);
    payload.put_slice(key);
    Ok(())
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (tag, payload) = unframe(bytes, "command")?;

    let cmd_type = CommandType::from_byte(tag).ok_or_else(|| {
        TideError::Protocol(format!("Unknown command type: 0x{:02x}", tag))
    })?;

    match cmd_type {
        CommandType::Get => {
            let (key, rest) = split_key(cmd_type, payload)?;
            expect_empty(cmd_type, rest)?;
            Ok(Command::Get { key })
        }
        CommandType::Put => {
            let (key, value) = split_key(cmd_type, payload)?;
            Ok(Command::Put {
                key,
                value: value.to_vec(),
            })
        }
        CommandType::Delete => {
            let (key, rest) = split_key(cmd_type, payload)?;
            expect_empty(cmd_type, rest)?;
            Ok(Command::Delete { key })
        }
        CommandType::Ping => {
            expect_empty(cmd_type, payload)?;
            Ok(Command::Ping)
        }
        CommandType::Stats => {
            expect_empty(cmd_type, payload)?;
            Ok(Command::Stats)
        }
    }
}

/// Split `key_len (4) + key + rest`
fn split_key(cmd_type: CommandType, payload: &[u8]) -> Result<(Vec<u8>, &[u8])> {
    let mut buf = payload;
    if buf.remaining() < 4 {
        return Err(TideError::Protocol(format!(
            "{} command: missing key length",
            cmd_type.name()
        )));
    }

    let key_len = buf.get_u32() as usize;
    if buf.remaining() < key_len {
        return Err(TideError::Protocol(format!(
            "{} command: incomplete key (expected {}, got {})",
            cmd_type.name(),
            key_len,
            buf.remaining()
        )));
    }

    Ok((buf[..key_len].to_vec(), &buf[key_len..]))
}

fn expect_empty(cmd_type: CommandType, rest: &[u8]) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(TideError::Protocol(format!(
            "{} command: unexpected {} trailing bytes",
            cmd_type.name(),
            rest.len()
        )))
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    frame(response.status as u8, payload)
}

/// Decode a response from bytes
///
/// An empty payload decodes as `None`.
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (tag, payload) = unframe(bytes, "response")?;

    let status = Status::from_byte(tag).ok_or_else(|| {
        TideError::Protocol(format!("Unknown response status: 0x{:02x}", tag))
    })?;

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader, "command")?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader, "response")?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
