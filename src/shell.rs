//! Interactive Shell
//!
//! Line-oriented front end over any [`KvStore`]: the local engine or a
//! remote server.
//!
//! ```text
//! > set name tide
//! OK
//! > get name
//! tide
//! > del name
//! tide
//! > get name
//! Key not found
//! > exit
//! Bye!
//! ```

use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::engine::Engine;
use crate::error::{Result, TideError};
use crate::network::Client;

const PROMPT: &str = "> ";

/// Storage the shell drives
pub trait KvStore {
    fn get(&mut self, key: &[u8]) -> Result<Vec<u8>>;
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;
    fn delete(&mut self, key: &[u8]) -> Result<Vec<u8>>;
}

impl KvStore for &Engine {
    fn get(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        Engine::get(self, key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        Engine::put(self, key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        Engine::delete(self, key)
    }
}

impl KvStore for Arc<Engine> {
    fn get(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        Engine::get(self, key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        Engine::put(self, key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        Engine::delete(self, key)
    }
}

impl KvStore for Client {
    fn get(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        Client::get(self, key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        Client::put(self, key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        Client::delete(self, key)
    }
}

/// Read-eval-print loop
pub struct Shell<R, W, S> {
    input: R,
    output: W,
    store: S,
}

impl<R: BufRead, W: Write, S: KvStore> Shell<R, W, S> {
    pub fn new(input: R, output: W, store: S) -> Self {
        Self { input, output, store }
    }

    /// Run until `exit` or end of input
    ///
    /// Store errors are printed and the loop carries on; only I/O errors on
    /// the shell's own streams end it early.
    pub fn run(&mut self) -> Result<()> {
        let mut line = String::new();

        loop {
            write!(self.output, "{}", PROMPT)?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            let Some((&verb, args)) = parts.split_first() else {
                writeln!(self.output, "Empty command")?;
                continue;
            };

            let reply = match verb {
                "exit" => break,
                "get" => self.get(args),
                "set" => self.set(args),
                "del" => self.del(args),
                _ => "Unknown command".to_string(),
            };
            writeln!(self.output, "{}", reply)?;
        }

        writeln!(self.output, "Bye!")?;
        self.output.flush()?;
        Ok(())
    }

    /// Give back the store (and streams) after the loop ends
    pub fn into_parts(self) -> (R, W, S) {
        (self.input, self.output, self.store)
    }

    fn get(&mut self, args: &[&str]) -> String {
        if let Some(msg) = check_arity(1, args) {
            return msg;
        }
        match self.store.get(args[0].as_bytes()) {
            Ok(value) => String::from_utf8_lossy(&value).into_owned(),
            Err(e) => describe(e),
        }
    }

    fn set(&mut self, args: &[&str]) -> String {
        if let Some(msg) = check_arity(2, args) {
            return msg;
        }
        match self.store.put(args[0].as_bytes(), args[1].as_bytes()) {
            Ok(()) => "OK".to_string(),
            Err(e) => describe(e),
        }
    }

    fn del(&mut self, args: &[&str]) -> String {
        if let Some(msg) = check_arity(1, args) {
            return msg;
        }
        match self.store.delete(args[0].as_bytes()) {
            Ok(value) => String::from_utf8_lossy(&value).into_owned(),
            Err(e) => describe(e),
        }
    }
}

fn check_arity(expected: usize, args: &[&str]) -> Option<String> {
    (args.len() != expected).then(|| {
        format!(
            "Expected {} argument(s), received: {}",
            expected,
            args.len()
        )
    })
}

fn describe(err: TideError) -> String {
    if err.is_not_found() {
        "Key not found".to_string()
    } else {
        tracing::warn!("shell command failed: {}", err);
        format!("Error: {}", err)
    }
}
