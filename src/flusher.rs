//! Background flush timer
//!
//! A dedicated thread that flushes the memtable on a fixed period, through
//! the same locked entry point synchronous callers use.

use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Sender};

use crate::engine::Engine;
use crate::error::Result;

/// Periodic flush task with a stop signal
///
/// Holds only a `Weak` reference: the timer never keeps the engine alive,
/// and exits on its own once the engine is dropped. Stopping (or dropping)
/// the timer joins the thread.
pub struct FlushTimer {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl FlushTimer {
    /// Spawn the timer thread
    pub fn start(engine: &Arc<Engine>, interval: Duration) -> Result<Self> {
        let engine: Weak<Engine> = Arc::downgrade(engine);
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let ticker = channel::tick(interval);

        let handle = thread::Builder::new()
            .name("tidekv-flush".to_string())
            .spawn(move || {
                tracing::debug!(?interval, "flush timer started");
                loop {
                    crossbeam::select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            let Some(engine) = engine.upgrade() else {
                                break;
                            };
                            match engine.flush() {
                                Ok(true) => tracing::debug!("timer flush wrote a segment"),
                                Ok(false) => {}
                                Err(e) => tracing::error!("timer flush failed: {}", e),
                            }
                        }
                    }
                }
                tracing::debug!("flush timer stopped");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            interval,
        })
    }

    /// Signal the thread and wait for it to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects the stop channel
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("flush timer thread panicked");
            }
        }
    }
}

impl Drop for FlushTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
