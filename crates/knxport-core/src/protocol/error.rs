//! Protocol errors

use std::io;

use thiserror::Error;

/// Errors reported by the serial transport
///
/// A poll that sees no data is not an error; it is reported as
/// [`PollingResult::Timeout`](super::PollingResult::Timeout).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Operation needs an open device
    #[error("Serial port is not open")]
    NotOpen,

    /// `init` or `attach` on an open transport
    #[error("Serial port is already open")]
    AlreadyOpen,

    /// The device could not be opened or configured
    #[error("Could not open serial device {path}: {source}")]
    DeviceOpen {
        /// Device path that was tried
        path: String,
        /// Underlying serial port error
        #[source]
        source: serialport::Error,
    },

    /// Waiting for input failed
    #[error("Polling the serial port failed: {0}")]
    Poll(#[source] io::Error),

    /// Reading input failed
    #[error("Reading from the serial port failed: {0}")]
    Read(#[source] io::Error),

    /// Writing output failed
    #[error("Writing to the serial port failed: {0}")]
    Write(#[source] io::Error),

    /// Asking the device how many bytes are buffered failed
    #[error("Querying waiting bytes failed: {0}")]
    Query(#[source] io::Error),

    /// Discarding pending output failed
    #[error("Flushing the transmitter failed: {0}")]
    Flush(#[source] io::Error),

    /// Opening devices by port id is not available on this platform
    #[error("Serial devices are not supported on this platform")]
    Unsupported,
}

impl TransportError {
    /// Raw OS error code captured from the failing system call, if any
    pub fn os_code(&self) -> Option<i32> {
        match self {
            TransportError::Poll(e)
            | TransportError::Read(e)
            | TransportError::Write(e)
            | TransportError::Query(e)
            | TransportError::Flush(e) => e.raw_os_error(),
            _ => None,
        }
    }
}

/// Errors that can occur while encoding or validating frames
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Output buffer cannot hold the frame
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes the frame needs
        needed: usize,
        /// Bytes the buffer offers
        available: usize,
    },

    /// Frame has the wrong size
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Required length
        expected: usize,
        /// Length received
        actual: usize,
    },

    /// Leading marker bytes do not match
    #[error("Invalid frame prolog")]
    InvalidProlog,

    /// Trailing marker bytes do not match
    #[error("Invalid frame epilog")]
    InvalidEpilog,

    /// Check octet does not match the frame body
    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch {
        /// Checksum computed over the body
        expected: u8,
        /// Check octet found in the frame
        actual: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_code_is_captured() {
        let err = TransportError::Poll(io::Error::from_raw_os_error(libc::EINTR));
        assert_eq!(err.os_code(), Some(libc::EINTR));
    }

    #[test]
    fn test_os_code_absent_for_state_errors() {
        assert_eq!(TransportError::NotOpen.os_code(), None);
        assert_eq!(TransportError::AlreadyOpen.os_code(), None);
    }

    #[test]
    fn test_checksum_mismatch_display() {
        let err = FrameError::ChecksumMismatch {
            expected: 0x1c,
            actual: 0x00,
        };
        assert_eq!(err.to_string(), "Checksum mismatch: expected 0x1c, got 0x00");
    }
}
