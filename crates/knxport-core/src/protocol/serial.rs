//! Serial port handling
//!
//! Device naming and low-level open/configure of the TP-UART serial line.

use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(unix)]
use serialport::TTYPort;

use super::TransportError;

/// Read timeout applied to the port itself. Reads are only issued after a
/// successful poll, so this just bounds a read that races a vanished byte.
const PORT_READ_TIMEOUT: Duration = Duration::from_millis(10);

#[cfg(any(target_os = "freebsd", target_os = "dragonfly"))]
const DEFAULT_DEVICE_PREFIX: &str = "/dev/cuau";

#[cfg(not(any(target_os = "freebsd", target_os = "dragonfly")))]
const DEFAULT_DEVICE_PREFIX: &str = "/dev/ttyS";

/// Strategy that maps a numeric port id to a device path
pub trait DeviceNaming: Send {
    /// Device path of serial port `port_id`
    fn device_path(&self, port_id: u32) -> String;
}

/// Names ports as `<prefix><N>`, e.g. `/dev/ttyS1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixNaming {
    prefix: String,
}

impl PrefixNaming {
    /// Naming with device paths starting at `prefix`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl DeviceNaming for PrefixNaming {
    fn device_path(&self, port_id: u32) -> String {
        format!("{}{}", self.prefix, port_id)
    }
}

/// Naming strategy for the platform this crate was built for
pub fn default_naming() -> PrefixNaming {
    PrefixNaming::new(DEFAULT_DEVICE_PREFIX)
}

/// Parity setting of the serial line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParityMode {
    /// No parity bit
    None,
    /// Odd parity
    Odd,
    /// TP-UART default
    #[default]
    Even,
}

impl From<ParityMode> for Parity {
    fn from(mode: ParityMode) -> Self {
        match mode {
            ParityMode::None => Parity::None,
            ParityMode::Odd => Parity::Odd,
            ParityMode::Even => Parity::Even,
        }
    }
}

/// Open and configure the serial device at `path`
#[cfg(unix)]
pub fn open_port(path: &str, baud_rate: u32, parity: ParityMode) -> Result<TTYPort, TransportError> {
    let open_error = |source: serialport::Error| TransportError::DeviceOpen {
        path: path.to_string(),
        source,
    };

    let mut port = serialport::new(path, baud_rate)
        .timeout(PORT_READ_TIMEOUT)
        .open_native()
        .map_err(open_error)?;
    configure_port(&mut port, parity).map_err(open_error)?;
    clear_buffers(&mut port);

    debug!(path, baud_rate, ?parity, "serial device opened");
    Ok(port)
}

/// Configure a serial port for TP-UART communication
///
/// Raw mode is set by the open itself; this fixes the character format to
/// 8 data bits, one stop bit, no flow control and the requested parity.
pub fn configure_port(port: &mut dyn SerialPort, parity: ParityMode) -> serialport::Result<()> {
    port.set_data_bits(DataBits::Eight)?;
    port.set_parity(parity.into())?;
    port.set_stop_bits(StopBits::One)?;
    port.set_flow_control(FlowControl::None)?;
    Ok(())
}

/// Drop whatever the device buffered before we took it over
fn clear_buffers(port: &mut dyn SerialPort) {
    if let Err(e) = port.clear(serialport::ClearBuffer::All) {
        warn!("failed to clear serial buffers: {} (continuing)", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_naming() {
        let naming = PrefixNaming::new("/dev/ttyUSB");
        assert_eq!(naming.device_path(0), "/dev/ttyUSB0");
        assert_eq!(naming.device_path(12), "/dev/ttyUSB12");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_default_naming_linux() {
        assert_eq!(default_naming().device_path(1), "/dev/ttyS1");
    }

    #[test]
    fn test_parity_mapping() {
        assert_eq!(Parity::from(ParityMode::Even), Parity::Even);
        assert_eq!(Parity::from(ParityMode::None), Parity::None);
        assert_eq!(ParityMode::default(), ParityMode::Even);
    }

    #[test]
    #[cfg(unix)]
    fn test_open_missing_device_fails() {
        let result = open_port("/dev/knxport-does-not-exist", 19200, ParityMode::Even);
        match result {
            Err(TransportError::DeviceOpen { path, .. }) => {
                assert_eq!(path, "/dev/knxport-does-not-exist")
            }
            other => panic!("Expected DeviceOpen, got {:?}", other.map(|_| ())),
        }
    }
}
