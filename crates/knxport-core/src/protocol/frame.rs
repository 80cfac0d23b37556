//! Frame encoding/validation
//!
//! Link-layer request frames are terminated by a check octet computed over
//! every preceding byte.
//!
//! Connect request layout (8 bytes):
//! - 3 bytes: prolog `BC AF FE`
//! - 2 bytes: physical address (big-endian)
//! - 2 bytes: epilog `60 80`
//! - 1 byte: checksum of the 7 bytes above

use byteorder::{BigEndian, ByteOrder};
use tracing::debug;

use super::{checksum, FrameError, CONNECT_EPILOG, CONNECT_PROLOG, CONNECT_REQUEST_LEN};

const ADDRESS_OFFSET: usize = CONNECT_PROLOG.len();
const EPILOG_OFFSET: usize = ADDRESS_OFFSET + 2;
const CHECKSUM_OFFSET: usize = EPILOG_OFFSET + CONNECT_EPILOG.len();

/// A complete frame, check octet included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes in the frame
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the frame holds no bytes at all
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The trailing check octet
    pub fn checksum(&self) -> Option<u8> {
        self.bytes.last().copied()
    }

    /// Check that the last byte matches the checksum of the rest
    pub fn verify(&self) -> Result<(), FrameError> {
        verify_checksum(&self.bytes)
    }

    /// Consume the frame, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Builder for checksum-terminated frames
pub struct FrameBuilder {
    body: Vec<u8>,
}

impl FrameBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            body: Vec::with_capacity(CONNECT_REQUEST_LEN),
        }
    }

    /// Add a single byte
    pub fn byte(mut self, b: u8) -> Self {
        self.body.push(b);
        self
    }

    /// Add raw bytes
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.body.extend_from_slice(data);
        self
    }

    /// Add a 16-bit value, high byte first
    pub fn u16_be(mut self, value: u16) -> Self {
        let mut bytes = [0u8; 2];
        BigEndian::write_u16(&mut bytes, value);
        self.body.extend_from_slice(&bytes);
        self
    }

    /// Append the check octet and finish the frame
    pub fn build(mut self) -> Frame {
        let fcs = checksum(&self.body);
        self.body.push(fcs);
        Frame { bytes: self.body }
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the connect request for `address`
pub fn build_connect_request(address: u16) -> Frame {
    let frame = FrameBuilder::new()
        .bytes(&CONNECT_PROLOG)
        .u16_be(address)
        .bytes(&CONNECT_EPILOG)
        .build();
    debug!(
        address = %format!("{address:#06x}"),
        frame = %hex_dump(frame.as_bytes()),
        "built connect request"
    );
    frame
}

/// Write the connect request for `address` into a caller-owned buffer
///
/// Returns the number of bytes written.
pub fn encode_connect_request(address: u16, buf: &mut [u8]) -> Result<usize, FrameError> {
    if buf.len() < CONNECT_REQUEST_LEN {
        return Err(FrameError::BufferTooSmall {
            needed: CONNECT_REQUEST_LEN,
            available: buf.len(),
        });
    }

    buf[..ADDRESS_OFFSET].copy_from_slice(&CONNECT_PROLOG);
    BigEndian::write_u16(&mut buf[ADDRESS_OFFSET..EPILOG_OFFSET], address);
    buf[EPILOG_OFFSET..CHECKSUM_OFFSET].copy_from_slice(&CONNECT_EPILOG);
    buf[CHECKSUM_OFFSET] = checksum(&buf[..CHECKSUM_OFFSET]);

    Ok(CONNECT_REQUEST_LEN)
}

/// Validate a connect request and return the address it carries
pub fn parse_connect_request(bytes: &[u8]) -> Result<u16, FrameError> {
    if bytes.len() != CONNECT_REQUEST_LEN {
        return Err(FrameError::InvalidLength {
            expected: CONNECT_REQUEST_LEN,
            actual: bytes.len(),
        });
    }
    if bytes[..ADDRESS_OFFSET] != CONNECT_PROLOG {
        return Err(FrameError::InvalidProlog);
    }
    if bytes[EPILOG_OFFSET..CHECKSUM_OFFSET] != CONNECT_EPILOG {
        return Err(FrameError::InvalidEpilog);
    }
    verify_checksum(bytes)?;

    Ok(BigEndian::read_u16(&bytes[ADDRESS_OFFSET..EPILOG_OFFSET]))
}

fn verify_checksum(bytes: &[u8]) -> Result<(), FrameError> {
    let Some((&actual, body)) = bytes.split_last() else {
        return Err(FrameError::InvalidLength {
            expected: 1,
            actual: 0,
        });
    };
    let expected = checksum(body);
    if expected != actual {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

/// Format bytes as space separated upper-case hex pairs
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_appends_checksum() {
        let frame = FrameBuilder::new().byte(0x01).byte(0x02).u16_be(0x0304).build();
        assert_eq!(frame.as_bytes(), &[0x01, 0x02, 0x03, 0x04, 0x04]);
        assert!(frame.verify().is_ok());
    }

    #[test]
    fn test_encode_matches_build() {
        let mut buf = [0u8; 32];
        let n = encode_connect_request(0x1234, &mut buf).expect("buffer is large enough");
        assert_eq!(&buf[..n], build_connect_request(0x1234).as_bytes());
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        let mut buf = [0u8; 7];
        assert_eq!(
            encode_connect_request(0x1234, &mut buf),
            Err(FrameError::BufferTooSmall {
                needed: 8,
                available: 7
            })
        );
    }

    #[test]
    fn test_parse_detects_corruption() {
        let mut bytes = build_connect_request(0x1101).into_bytes();
        bytes[4] ^= 0x01;
        assert!(matches!(
            parse_connect_request(&bytes),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_markers() {
        let mut bytes = build_connect_request(0x1101).into_bytes();
        bytes[0] = 0xB0;
        assert_eq!(parse_connect_request(&bytes), Err(FrameError::InvalidProlog));

        let mut bytes = build_connect_request(0x1101).into_bytes();
        bytes[6] = 0x81;
        assert_eq!(parse_connect_request(&bytes), Err(FrameError::InvalidEpilog));
    }

    #[test]
    fn test_verify_empty_frame() {
        let frame = Frame { bytes: Vec::new() };
        assert!(frame.is_empty());
        assert!(frame.verify().is_err());
    }

    #[test]
    fn test_hex_dump() {
        assert_eq!(hex_dump(&[0xBC, 0x0A, 0x00]), "BC 0A 00");
        assert_eq!(hex_dump(&[]), "");
        assert_eq!(hex_dump(&[0x1C]), "1C");
    }
}
