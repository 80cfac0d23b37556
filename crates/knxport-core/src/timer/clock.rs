//! System tick source
//!
//! Drives a [`TimerTable`] from a dedicated clock thread. Deadlines are
//! absolute, so a slow callback delays the next tick but does not shift the
//! whole schedule.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use super::TimerTable;

/// Default tick period in milliseconds
pub const DEFAULT_TICK_MS: u64 = 10;

/// Running tick source; stops when dropped
pub struct SystemTick {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl SystemTick {
    /// Start ticking `table` every `period`
    pub fn start(table: Arc<TimerTable>, period: Duration) -> io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let period = period.max(Duration::from_millis(1));

        let handle = thread::Builder::new()
            .name("knx-tick".to_string())
            .spawn(move || {
                let mut next = Instant::now() + period;
                loop {
                    let wait = next.saturating_duration_since(Instant::now());
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            table.tick();
                            trace!(ticks = table.ticks(), "system tick");
                            next += period;
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        debug!(period_ms = period.as_millis() as u64, "system tick started");
        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
            period,
        })
    }

    /// Effective tick period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stop the clock thread and wait for it to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("system tick thread panicked");
            }
            debug!("system tick stopped");
        }
    }
}

impl Drop for SystemTick {
    fn drop(&mut self) {
        self.shutdown();
    }
}
