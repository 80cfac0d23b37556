//! Frame check octet
//!
//! Every frame on the line ends with a single byte that is the XOR of all
//! bytes before it. Folding from `0x00` is the same as seeding with the first
//! frame byte and folding the rest, so an empty slice yields `0x00`.

/// Identity value of the XOR fold
pub const CHECKSUM_SEED: u8 = 0x00;

/// Compute the check octet over `bytes`
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(CHECKSUM_SEED, |acc, b| acc ^ b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_seed() {
        assert_eq!(checksum(&[]), CHECKSUM_SEED);
    }

    #[test]
    fn test_single_byte_is_itself() {
        assert_eq!(checksum(&[0xBC]), 0xBC);
    }

    #[test]
    fn test_reference_connect_request() {
        let bytes = [0xBC, 0xAF, 0xFE, 0xBE, 0xAF, 0x60, 0x80];
        assert_eq!(checksum(&bytes), 0x1C);
    }

    #[test]
    fn test_appending_checksum_cancels_out() {
        let mut bytes = vec![0x11, 0x22, 0x33, 0x44];
        let fcs = checksum(&bytes);
        bytes.push(fcs);
        assert_eq!(checksum(&bytes), 0x00);
    }

    #[test]
    fn test_deterministic() {
        let data: Vec<u8> = (0..=255u8).collect();
        assert_eq!(checksum(&data), checksum(&data));
    }
}
