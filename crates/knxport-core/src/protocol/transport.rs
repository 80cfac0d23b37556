//! Transport management
//!
//! Owns the serial device and hands out bytes through a polled, single
//! threaded interface. The device is either `Closed` or `Open`; every
//! operation on a closed transport fails with [`TransportError::NotOpen`].

use std::io::{self, Read, Write};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{
    default_naming, DeviceNaming, ParityMode, SerialDevice, TransportError, DEFAULT_BAUD_RATE,
    DEFAULT_POLL_TIMEOUT_MS,
};

/// Outcome of one polling step
#[derive(Debug)]
pub enum PollingResult {
    /// Input is ready to be read
    Ok,
    /// The wait itself failed
    Error(TransportError),
    /// Nothing arrived within the wait window
    Timeout,
}

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// No device is held
    Closed,
    /// A device is open and owned by the transport
    Open,
}

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Baud rate
    pub baud_rate: u32,
    /// Parity of the line
    pub parity: ParityMode,
    /// Wait window of one task step
    pub poll_timeout: Duration,
    /// Discard pending output on `flush()`
    pub flush_transmitter: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            parity: ParityMode::Even,
            poll_timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
            flush_transmitter: true,
        }
    }
}

/// Serial transport with poll-driven input
pub struct SerialTransport {
    /// Open device, if any
    device: Option<Box<dyn SerialDevice>>,
    /// Path the device was opened from
    device_path: Option<String>,
    config: TransportConfig,
    naming: Box<dyn DeviceNaming>,
}

impl SerialTransport {
    /// Create a closed transport using the platform device naming
    pub fn new(config: TransportConfig) -> Self {
        Self::with_naming(config, default_naming())
    }

    /// Create a closed transport with a custom naming strategy
    pub fn with_naming(config: TransportConfig, naming: impl DeviceNaming + 'static) -> Self {
        Self {
            device: None,
            device_path: None,
            config,
            naming: Box::new(naming),
        }
    }

    /// Current state of the transport
    pub fn state(&self) -> TransportState {
        if self.device.is_some() {
            TransportState::Open
        } else {
            TransportState::Closed
        }
    }

    /// True while a device is held
    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Path of the open device, if it was opened by port id
    pub fn device_path(&self) -> Option<&str> {
        self.device_path.as_deref()
    }

    /// Open serial port `port_id`
    ///
    /// On failure nothing is retained and the transport stays closed.
    #[cfg(unix)]
    pub fn init(&mut self, port_id: u32) -> Result<(), TransportError> {
        if self.is_open() {
            return Err(TransportError::AlreadyOpen);
        }

        let path = self.naming.device_path(port_id);
        let port = super::open_port(&path, self.config.baud_rate, self.config.parity)?;

        info!(path = %path, baud_rate = self.config.baud_rate, "serial transport open");
        self.device = Some(Box::new(super::SerialChannel::new(port)));
        self.device_path = Some(path);
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn init(&mut self, _port_id: u32) -> Result<(), TransportError> {
        Err(TransportError::Unsupported)
    }

    /// Adopt a device that is already open
    pub fn attach(&mut self, device: Box<dyn SerialDevice>) -> Result<(), TransportError> {
        if self.is_open() {
            return Err(TransportError::AlreadyOpen);
        }
        debug!("serial transport attached to external device");
        self.device = Some(device);
        Ok(())
    }

    /// Release the device. Safe to call when closed.
    pub fn deinit(&mut self) {
        if self.device.take().is_some() {
            info!(path = ?self.device_path, "serial transport closed");
        }
        self.device_path = None;
    }

    /// One polling step with the configured wait window
    pub fn task_step(&mut self) -> PollingResult {
        let timeout = self.config.poll_timeout;
        self.poll(timeout)
    }

    /// Wait up to `timeout` for input readiness
    pub fn poll(&mut self, timeout: Duration) -> PollingResult {
        let Some(device) = self.device.as_mut() else {
            return PollingResult::Error(TransportError::NotOpen);
        };
        match device.wait_readable(timeout) {
            Ok(true) => PollingResult::Ok,
            Ok(false) => PollingResult::Timeout,
            Err(e) => PollingResult::Error(TransportError::Poll(e)),
        }
    }

    /// Number of bytes buffered for reading, without consuming them
    pub fn bytes_waiting(&mut self) -> Result<usize, TransportError> {
        let device = self.device_mut()?;
        device
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(TransportError::Query)
    }

    /// Read up to `max_count` bytes into `buf`
    ///
    /// Fewer bytes than requested, including none, is not an error.
    pub fn read(&mut self, buf: &mut [u8], max_count: usize) -> Result<usize, TransportError> {
        let device = self.device_mut()?;
        let wanted = max_count.min(buf.len());
        if wanted == 0 {
            return Ok(0);
        }
        match device.read(&mut buf[..wanted]) {
            Ok(n) => Ok(n),
            Err(e) if is_no_data(&e) => Ok(0),
            Err(e) => Err(TransportError::Read(e)),
        }
    }

    /// Write all of `bytes` to the line
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let device = self.device_mut()?;
        device.write_all(bytes).map_err(TransportError::Write)?;
        debug!(len = bytes.len(), "wrote bytes to serial line");
        Ok(())
    }

    /// Discard output that has not been transmitted yet
    ///
    /// A no-op unless the transport is configured to flush its transmitter.
    pub fn flush(&mut self) -> Result<(), TransportError> {
        let flush_transmitter = self.config.flush_transmitter;
        let device = self.device_mut()?;
        if !flush_transmitter {
            return Ok(());
        }
        device.clear_output_buffer().map_err(|e| {
            warn!("failed to flush transmitter: {}", e);
            TransportError::Flush(e)
        })
    }

    fn device_mut(&mut self) -> Result<&mut Box<dyn SerialDevice>, TransportError> {
        self.device.as_mut().ok_or(TransportError::NotOpen)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.deinit();
    }
}

fn is_no_data(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
