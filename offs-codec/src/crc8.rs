use crc::{Crc, CRC_8_SMBUS};

static CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// CRC-8 (SMBUS polynomial) over `bytes`, used to guard the CBL header
/// against bit-rot between the creator-id field and the signature slot.
pub fn crc8(bytes: &[u8]) -> u8 {
    CRC8.checksum(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(crc8(b"offs"), crc8(b"offs"));
    }

    #[test]
    fn sensitive_to_input() {
        assert_ne!(crc8(b"offs"), crc8(b"ofFs"));
    }
}
