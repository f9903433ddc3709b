//! Tests for the wire protocol codec
//!
//! These tests verify:
//! - Exact command and response framing
//! - Rejection of malformed or oversized messages
//! - Stream helpers over an in-memory buffer

use std::io::Cursor;

use tidekv::protocol::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, Command, CommandType, Response, Status,
    HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use tidekv::TideError;

// =============================================================================
// Command Encoding Tests
// =============================================================================

#[test]
fn test_encode_get_layout() {
    let bytes = encode_command(&Command::Get { key: b"ab".to_vec() }).unwrap();

    assert_eq!(bytes, vec![0x01, 0, 0, 0, 6, 0, 0, 0, 2, b'a', b'b']);
}

#[test]
fn test_encode_put_layout() {
    let bytes = encode_command(&Command::Put {
        key: b"k".to_vec(),
        value: b"vv".to_vec(),
    })
    .unwrap();

    assert_eq!(bytes, vec![0x02, 0, 0, 0, 7, 0, 0, 0, 1, b'k', b'v', b'v']);
}

#[test]
fn test_encode_ping_and_stats() {
    assert_eq!(encode_command(&Command::Ping).unwrap(), vec![0x04, 0, 0, 0, 0]);
    assert_eq!(encode_command(&Command::Stats).unwrap(), vec![0x05, 0, 0, 0, 0]);
}

#[test]
fn test_decode_every_command() {
    let commands = vec![
        Command::Get { key: b"key".to_vec() },
        Command::Put {
            key: b"key".to_vec(),
            value: b"value".to_vec(),
        },
        Command::Put {
            key: Vec::new(),
            value: Vec::new(),
        },
        Command::Delete { key: b"key".to_vec() },
        Command::Ping,
        Command::Stats,
    ];

    for command in commands {
        let bytes = encode_command(&command).unwrap();
        assert_eq!(decode_command(&bytes).unwrap(), command);
    }
}

#[test]
fn test_command_type_bytes() {
    assert_eq!(CommandType::from_byte(0x05), Some(CommandType::Stats));
    assert_eq!(CommandType::from_byte(0x00), None);
    assert_eq!(Command::Delete { key: vec![] }.command_type().name(), "DELETE");
}

// =============================================================================
// Command Decoding Error Tests
// =============================================================================

#[test]
fn test_decode_command_short_header() {
    let result = decode_command(&[0x01, 0, 0]);
    assert!(matches!(result, Err(TideError::Protocol(_))));
}

#[test]
fn test_decode_command_unknown_type() {
    let result = decode_command(&[0x09, 0, 0, 0, 0]);
    assert!(matches!(result, Err(TideError::Protocol(_))));
}

#[test]
fn test_decode_command_incomplete_payload() {
    let result = decode_command(&[0x01, 0, 0, 0, 10, 0, 0]);
    assert!(matches!(result, Err(TideError::Protocol(_))));
}

#[test]
fn test_decode_command_key_longer_than_payload() {
    let result = decode_command(&[0x01, 0, 0, 0, 5, 0, 0, 0, 9, b'a']);
    assert!(matches!(result, Err(TideError::Protocol(_))));
}

#[test]
fn test_decode_get_rejects_trailing_bytes() {
    let result = decode_command(&[0x01, 0, 0, 0, 6, 0, 0, 0, 1, b'a', b'x']);
    assert!(matches!(result, Err(TideError::Protocol(_))));
}

#[test]
fn test_decode_ping_rejects_payload() {
    let result = decode_command(&[0x04, 0, 0, 0, 1, b'x']);
    assert!(matches!(result, Err(TideError::Protocol(_))));
}

#[test]
fn test_decode_oversized_payload_rejected() {
    let mut bytes = vec![0x02];
    bytes.extend_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_be_bytes());

    let result = decode_command(&bytes);
    assert!(matches!(result, Err(TideError::Protocol(_))));

    // Stream reads refuse before allocating
    let result = read_command(&mut Cursor::new(bytes));
    assert!(matches!(result, Err(TideError::Protocol(_))));
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_encode_response_layout() {
    let ok = encode_response(&Response::ok(Some(b"v".to_vec()))).unwrap();
    assert_eq!(ok, vec![0x00, 0, 0, 0, 1, b'v']);

    let not_found = encode_response(&Response::not_found()).unwrap();
    assert_eq!(not_found, vec![0x01, 0, 0, 0, 0]);
    assert_eq!(not_found.len(), HEADER_SIZE);
}

#[test]
fn test_decode_response_empty_payload_is_none() {
    let response = decode_response(&[0x00, 0, 0, 0, 0]).unwrap();

    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.payload, None);
}

#[test]
fn test_error_response_message() {
    let bytes = encode_response(&Response::error("boom")).unwrap();
    let response = decode_response(&bytes).unwrap();

    assert_eq!(response.status, Status::Error);
    assert_eq!(response.error_message().as_deref(), Some("boom"));
    assert_eq!(Response::ok(None).error_message(), None);
}

#[test]
fn test_decode_response_unknown_status() {
    let result = decode_response(&[0x07, 0, 0, 0, 0]);
    assert!(matches!(result, Err(TideError::Protocol(_))));
}

// =============================================================================
// Stream Helper Tests
// =============================================================================

#[test]
fn test_stream_commands_back_to_back() {
    let mut buf = Vec::new();
    write_command(&mut buf, &Command::Ping).unwrap();
    write_command(&mut buf, &Command::Get { key: b"a".to_vec() }).unwrap();

    let mut cursor = Cursor::new(buf);
    assert_eq!(read_command(&mut cursor).unwrap(), Command::Ping);
    assert_eq!(
        read_command(&mut cursor).unwrap(),
        Command::Get { key: b"a".to_vec() }
    );
    assert!(matches!(read_command(&mut cursor), Err(TideError::Io(_))));
}

#[test]
fn test_stream_response() {
    let mut buf = Vec::new();
    write_response(&mut buf, &Response::ok(Some(b"PONG".to_vec()))).unwrap();

    let response = read_response(&mut Cursor::new(buf)).unwrap();
    assert_eq!(response, Response::ok(Some(b"PONG".to_vec())));
}
