//! Serial Protocol Communication
//!
//! Implements the byte-level side of a KNX TP-UART link: the frame checksum,
//! the connect-request frame layout and the polled serial transport.

pub mod checksum;
mod error;
pub mod frame;
pub mod serial;
pub mod stream;
mod transport;

pub use checksum::checksum;
pub use error::{FrameError, TransportError};
pub use frame::{
    build_connect_request, encode_connect_request, hex_dump, parse_connect_request, Frame,
    FrameBuilder,
};
#[cfg(unix)]
pub use serial::open_port;
pub use serial::{configure_port, default_naming, DeviceNaming, ParityMode, PrefixNaming};
pub use stream::SerialDevice;
#[cfg(unix)]
pub use stream::SerialChannel;
pub use transport::{PollingResult, SerialTransport, TransportConfig, TransportState};

/// Default baud rate of a TP-UART interface
pub const DEFAULT_BAUD_RATE: u32 = 19200;

/// Default wait window of one polling step in milliseconds
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;

/// Leading marker bytes of a connect request
pub const CONNECT_PROLOG: [u8; 3] = [0xBC, 0xAF, 0xFE];

/// Trailing marker bytes of a connect request, before the checksum
pub const CONNECT_EPILOG: [u8; 2] = [0x60, 0x80];

/// Total size of an encoded connect request
pub const CONNECT_REQUEST_LEN: usize = CONNECT_PROLOG.len() + 2 + CONNECT_EPILOG.len() + 1;
