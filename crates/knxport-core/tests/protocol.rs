use knxport_core::protocol::{
    build_connect_request, checksum, encode_connect_request, parse_connect_request, FrameBuilder,
    FrameError, CONNECT_EPILOG, CONNECT_PROLOG, CONNECT_REQUEST_LEN,
};
use pretty_assertions::assert_eq;

/// Addresses covering both byte halves, the extremes and a few patterns
const SAMPLE_ADDRESSES: [u16; 9] = [
    0x0000, 0x0001, 0x00FF, 0x0100, 0x1105, 0x7FFF, 0x8000, 0xBEAF, 0xFFFF,
];

#[test]
fn test_reference_connect_request() {
    let frame = build_connect_request(0xBEAF);
    assert_eq!(
        frame.as_bytes(),
        &[0xBC, 0xAF, 0xFE, 0xBE, 0xAF, 0x60, 0x80, 0x1C]
    );
}

#[test]
fn test_reference_checksum_is_xor_fold() {
    let body = [0xBC, 0xAF, 0xFE, 0xBE, 0xAF, 0x60, 0x80];
    let folded = body.iter().fold(0u8, |acc, b| acc ^ b);
    assert_eq!(checksum(&body), folded);
    assert_eq!(build_connect_request(0xBEAF).checksum(), Some(folded));
}

#[test]
fn test_connect_request_layout() {
    for address in SAMPLE_ADDRESSES {
        let frame = build_connect_request(address);
        let bytes = frame.as_bytes();

        assert_eq!(bytes.len(), CONNECT_REQUEST_LEN);
        assert_eq!(&bytes[0..3], &CONNECT_PROLOG);
        assert_eq!(&bytes[3..5], &address.to_be_bytes());
        assert_eq!(&bytes[5..7], &CONNECT_EPILOG);
        assert_eq!(bytes[7], checksum(&bytes[..7]));
    }
}

#[test]
fn test_connect_request_parses_back() {
    for address in SAMPLE_ADDRESSES {
        let frame = build_connect_request(address);
        assert!(frame.verify().is_ok());
        assert_eq!(parse_connect_request(frame.as_bytes()), Ok(address));
    }
}

#[test]
fn test_caller_buffer_encoding() {
    let mut buf = [0xEEu8; 16];
    let written = encode_connect_request(0xBEAF, &mut buf).unwrap();
    assert_eq!(written, 8);
    assert_eq!(&buf[..written], build_connect_request(0xBEAF).as_bytes());
    // Bytes past the frame are untouched
    assert!(buf[written..].iter().all(|&b| b == 0xEE));
}

#[test]
fn test_checksum_deterministic() {
    let inputs: [&[u8]; 4] = [&[], &[0x00], &[0xFF, 0x01, 0x80], b"TP-UART"];
    for input in inputs {
        assert_eq!(checksum(input), checksum(input));
    }
}

#[test]
fn test_truncated_frame_rejected() {
    let frame = build_connect_request(0x1105);
    assert_eq!(
        parse_connect_request(&frame.as_bytes()[..7]),
        Err(FrameError::InvalidLength {
            expected: 8,
            actual: 7
        })
    );
}

#[test]
fn test_builder_frames_verify() {
    let frame = FrameBuilder::new()
        .byte(0xBC)
        .u16_be(0x1105)
        .bytes(&[0x00, 0x01, 0x02])
        .build();
    assert_eq!(frame.len(), 7);
    assert!(frame.verify().is_ok());
}

#[test]
fn test_frame_error_display() {
    let err = FrameError::InvalidProlog;
    assert!(!err.to_string().is_empty());
}
