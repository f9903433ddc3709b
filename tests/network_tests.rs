//! End-to-end tests over TCP
//!
//! Each test binds a server to an ephemeral port and talks to it through
//! `Client`.

use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tidekv::config::Config;
use tidekv::engine::Engine;
use tidekv::network::{Client, Server, ShutdownHandle};
use tidekv::protocol::{read_response, Status};
use tidekv::TideError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct TestServer {
    _temp: TempDir,
    addr: SocketAddr,
    engine: Arc<Engine>,
    shutdown: ShutdownHandle,
    handle: Option<JoinHandle<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

fn start_server(max_connections: usize) -> TestServer {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .listen_addr("127.0.0.1:0")
        .max_connections(max_connections)
        .flush_interval(None)
        .build();

    let engine = Arc::new(Engine::open(config.clone()).unwrap());
    let server = Server::bind(config, Arc::clone(&engine)).unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle();
    let handle = thread::spawn(move || server.run().unwrap());

    TestServer {
        _temp: temp,
        addr,
        engine,
        shutdown,
        handle: Some(handle),
    }
}

fn connect(server: &TestServer) -> Client {
    let client = Client::connect(server.addr).unwrap();
    client.set_timeout(Some(Duration::from_secs(5))).unwrap();
    client
}

// =============================================================================
// Command Tests
// =============================================================================

#[test]
fn test_client_ping() {
    let server = start_server(16);
    let mut client = connect(&server);

    client.ping().unwrap();
}

#[test]
fn test_client_put_get_delete() {
    let server = start_server(16);
    let mut client = connect(&server);

    client.put(b"name", b"tide").unwrap();
    assert_eq!(client.get(b"name").unwrap(), b"tide");

    assert_eq!(client.delete(b"name").unwrap(), b"tide");
    assert!(matches!(client.get(b"name"), Err(TideError::KeyNotFound)));
    assert!(matches!(client.delete(b"name"), Err(TideError::KeyNotFound)));
}

#[test]
fn test_client_empty_value() {
    let server = start_server(16);
    let mut client = connect(&server);

    client.put(b"empty", b"").unwrap();
    assert_eq!(client.get(b"empty").unwrap(), Vec::<u8>::new());
}

#[test]
fn test_client_stats() {
    let server = start_server(16);
    let mut client = connect(&server);
    client.put(b"a", b"1").unwrap();
    server.engine.flush().unwrap();
    client.put(b"b", b"2").unwrap();

    let stats = client.stats().unwrap();

    assert_eq!(stats.segment_count, 1);
    assert_eq!(stats.memtable_entries, 1);
    assert_eq!(stats, server.engine.stats().unwrap());
}

#[test]
fn test_writes_visible_to_engine() {
    let server = start_server(16);
    let mut client = connect(&server);

    client.put(b"k", b"v").unwrap();

    assert_eq!(server.engine.get(b"k").unwrap(), b"v");
}

#[test]
fn test_many_clients() {
    let server = start_server(16);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let addr = server.addr;
            thread::spawn(move || {
                let mut client = Client::connect(addr).unwrap();
                for i in 0..25 {
                    let key = format!("c{}-{}", t, i);
                    client.put(key.as_bytes(), b"x").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(server.engine.memtable_entry_count(), 100);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_malformed_request_gets_error_response() {
    let server = start_server(16);
    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    // Unknown command type
    stream.write_all(&[0x42, 0, 0, 0, 0]).unwrap();

    let response = read_response(&mut stream).unwrap();
    assert_eq!(response.status, Status::Error);
    assert!(response.error_message().unwrap().contains("Unknown command"));
}

#[test]
fn test_connection_limit() {
    let server = start_server(1);
    let mut first = connect(&server);
    first.ping().unwrap();

    // The refusal is sent unprompted, then the socket is closed
    let mut second = TcpStream::connect(server.addr).unwrap();
    second.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let response = read_response(&mut second).unwrap();

    assert_eq!(response.status, Status::Error);
    assert!(response.error_message().unwrap().contains("too many connections"));

    // The first client is unaffected
    first.ping().unwrap();
}
