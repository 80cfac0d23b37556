//! Byte streams underneath the transport

use std::io::{self, Read, Write};
use std::time::Duration;

#[cfg(unix)]
use serialport::{SerialPort, TTYPort};
#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Abstraction for the byte pipe underneath the transport
pub trait SerialDevice: Read + Write + Send {
    /// Block until input is readable or `timeout` expires.
    ///
    /// Returns `Ok(true)` when data can be read, `Ok(false)` on timeout.
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Get number of bytes available to read
    fn bytes_to_read(&mut self) -> io::Result<u32>;

    /// Discard output that has not been transmitted yet
    fn clear_output_buffer(&mut self) -> io::Result<()>;
}

/// Native serial port wrapper implementing SerialDevice
#[cfg(unix)]
pub struct SerialChannel {
    port: TTYPort,
}

#[cfg(unix)]
impl SerialChannel {
    /// Wrap an opened port
    pub fn new(port: TTYPort) -> Self {
        Self { port }
    }
}

#[cfg(unix)]
impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

#[cfg(unix)]
impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

#[cfg(unix)]
impl SerialDevice for SerialChannel {
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        let mut fd = libc::pollfd {
            fd: self.port.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

        // SAFETY: `fd` is a valid pollfd for the duration of the call and the
        // descriptor stays open while `self.port` is borrowed.
        let rc = unsafe { libc::poll(&mut fd, 1, timeout_ms) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        if rc == 0 {
            return Ok(false);
        }
        if fd.revents & libc::POLLIN != 0 {
            return Ok(true);
        }
        if fd.revents & libc::POLLNVAL != 0 {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }
        Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            format!("serial line reported poll events {:#06x}", fd.revents),
        ))
    }

    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.port.bytes_to_read().map_err(io::Error::from)
    }

    fn clear_output_buffer(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Output)
            .map_err(io::Error::from)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn pty_pair() -> Option<(SerialChannel, TTYPort)> {
        match TTYPort::pair() {
            Ok((master, slave)) => Some((SerialChannel::new(master), slave)),
            Err(e) => {
                eprintln!("skipping: no pseudo terminal available ({})", e);
                None
            }
        }
    }

    #[test]
    fn test_wait_readable_times_out() {
        let Some((mut channel, _slave)) = pty_pair() else {
            return;
        };
        let start = Instant::now();
        let ready = channel
            .wait_readable(Duration::from_millis(50))
            .expect("poll should succeed");
        assert!(!ready);
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_wait_readable_sees_data() {
        let Some((mut channel, mut slave)) = pty_pair() else {
            return;
        };
        slave.write_all(&[0xBC, 0xAF]).expect("write to slave");
        let ready = channel
            .wait_readable(Duration::from_secs(2))
            .expect("poll should succeed");
        assert!(ready);
    }
}
