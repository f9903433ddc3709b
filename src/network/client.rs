//! Blocking TCP client
//!
//! One request, one response, over a persistent connection.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::engine::EngineStats;
use crate::error::{Result, TideError};
use crate::protocol::{read_response, write_command, Command, Response, Status};

/// Client for a TideKV server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Bound how long a response may take
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        self.writer.get_ref().set_write_timeout(timeout)?;
        Ok(())
    }

    /// Send a command and wait for its response
    pub fn request(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    pub fn get(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        let response = self.request(&Command::Get { key: key.to_vec() })?;
        into_value(response)
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let response = self.request(&Command::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })?;
        into_value(response).map(|_| ())
    }

    /// Delete a key, returning the value it held
    pub fn delete(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        let response = self.request(&Command::Delete { key: key.to_vec() })?;
        into_value(response)
    }

    pub fn ping(&mut self) -> Result<()> {
        let payload = into_value(self.request(&Command::Ping)?)?;
        if payload != b"PONG" {
            return Err(TideError::Protocol(format!(
                "unexpected PING reply: {:?}",
                String::from_utf8_lossy(&payload)
            )));
        }
        Ok(())
    }

    pub fn stats(&mut self) -> Result<EngineStats> {
        let payload = into_value(self.request(&Command::Stats)?)?;
        Ok(bincode::deserialize(&payload)?)
    }
}

/// Map a response onto the engine's result shape
fn into_value(response: Response) -> Result<Vec<u8>> {
    match response.status {
        Status::Ok => Ok(response.payload.unwrap_or_default()),
        Status::NotFound => Err(TideError::KeyNotFound),
        Status::Error => Err(TideError::Server(
            response.error_message().unwrap_or_default(),
        )),
    }
}
