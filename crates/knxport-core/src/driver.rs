//! Driver loop
//!
//! Pumps bytes from the serial transport into the link layer for a bounded
//! number of polling steps, then waits for the link layer to finish
//! transmitting before the port is closed.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::link::LinkLayer;
use crate::protocol::{hex_dump, PollingResult, SerialDevice, SerialTransport, TransportError};

/// Size of the receive buffer handed to each read
pub const READ_BUFFER_SIZE: usize = 128;

/// Default number of polling steps per session
pub const DEFAULT_ITERATIONS: u32 = 8;

/// Driver configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Polling steps per `run()`
    pub iterations: u32,
    /// Sleep between busy checks while draining
    pub busy_poll_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            busy_poll_interval: Duration::from_millis(1),
        }
    }
}

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Polling steps taken
    pub polls: u32,
    /// Steps that found input ready
    pub ready: u32,
    /// Steps that saw nothing within the wait window
    pub timeouts: u32,
    /// Steps whose wait failed
    pub poll_errors: u32,
    /// Failed byte-count queries and reads
    pub read_errors: u32,
    /// Bytes handed to the link layer
    pub bytes_received: u64,
    /// Wall time spent in `run()`
    pub elapsed: Duration,
}

/// Couples a [`SerialTransport`] with a [`LinkLayer`]
pub struct Driver<L: LinkLayer> {
    transport: SerialTransport,
    link: L,
    config: DriverConfig,
    buffer: [u8; READ_BUFFER_SIZE],
}

impl<L: LinkLayer> Driver<L> {
    /// Create a driver around a closed transport
    pub fn new(transport: SerialTransport, link: L, config: DriverConfig) -> Self {
        Self {
            transport,
            link,
            config,
            buffer: [0; READ_BUFFER_SIZE],
        }
    }

    /// The serial transport
    pub fn transport(&self) -> &SerialTransport {
        &self.transport
    }

    /// Mutable access to the transport, e.g. to send a frame
    pub fn transport_mut(&mut self) -> &mut SerialTransport {
        &mut self.transport
    }

    /// The link layer
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Open serial port `port_id` and initialise the link layer
    ///
    /// An open failure is returned untouched for the caller to report; the
    /// link layer is not initialised in that case.
    pub fn start(&mut self, port_id: u32) -> Result<(), TransportError> {
        self.transport.init(port_id)?;
        self.link.init();
        Ok(())
    }

    /// Use an already opened device and initialise the link layer
    pub fn attach(&mut self, device: Box<dyn SerialDevice>) -> Result<(), TransportError> {
        self.transport.attach(device)?;
        self.link.init();
        Ok(())
    }

    /// Run the configured number of polling steps
    pub fn run(&mut self) -> SessionReport {
        let started = Instant::now();
        let mut report = SessionReport::default();

        for _ in 0..self.config.iterations {
            report.polls += 1;
            match self.transport.task_step() {
                PollingResult::Ok => {
                    report.ready += 1;
                    self.pump(&mut report);
                }
                PollingResult::Error(e) => {
                    report.poll_errors += 1;
                    warn!(os_code = ?e.os_code(), "poll failed: {}", e);
                }
                PollingResult::Timeout => {
                    report.timeouts += 1;
                    debug!("poll timeout");
                }
            }
        }

        report.elapsed = started.elapsed();
        report
    }

    /// Forward everything currently waiting to the link layer
    fn pump(&mut self, report: &mut SessionReport) {
        let mut remaining = match self.transport.bytes_waiting() {
            Ok(count) => count,
            Err(e) => {
                report.read_errors += 1;
                warn!(os_code = ?e.os_code(), "bytes waiting query failed: {}", e);
                return;
            }
        };
        debug!(count = remaining, "bytes waiting");

        while remaining > 0 {
            let n = match self.transport.read(&mut self.buffer, remaining) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    report.read_errors += 1;
                    warn!(os_code = ?e.os_code(), "read failed: {}", e);
                    return;
                }
            };
            debug!(data = %hex_dump(&self.buffer[..n]), "received");
            for &byte in &self.buffer[..n] {
                self.link.feed_receiver(byte);
            }
            report.bytes_received += n as u64;
            remaining -= n.min(remaining);
        }
    }

    /// Block until the link layer is idle
    pub fn wait_until_idle(&self) {
        while self.link.is_busy() {
            thread::sleep(self.config.busy_poll_interval);
        }
    }

    /// Wait for the link layer to go idle, then close the port
    pub fn finish(&mut self) {
        self.wait_until_idle();
        self.transport.deinit();
    }

    /// Open, run and close one session on `port_id`
    pub fn run_session(&mut self, port_id: u32) -> Result<SessionReport, TransportError> {
        self.start(port_id)?;
        let report = self.run();
        self.finish();
        info!(
            polls = report.polls,
            timeouts = report.timeouts,
            bytes = report.bytes_received,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "session finished"
        );
        Ok(report)
    }
}
