//! RFC 7252 section 3.1 extended value encoding, shared by the option delta and option length
//! fields.  Both the parser and the builders go through [`decode_value`] / [`encode_value`] so
//! the two directions cannot drift apart.

use crate::codec::cursor::Cursor;
use crate::error::{CoapError, Malformed};

const ONE_BYTE_NIBBLE: u8 = 13;
const TWO_BYTE_NIBBLE: u8 = 14;
pub(crate) const RESERVED_NIBBLE: u8 = 15;

const ONE_BYTE_BASE: u16 = 13;
const TWO_BYTE_BASE: u16 = 269;

/// Header nibble plus the 0-2 extension bytes that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extended {
    nibble: u8,
    ext: [u8; 2],
    ext_len: usize,
}

impl Extended {
    pub fn nibble(&self) -> u8 {
        self.nibble
    }

    pub fn extension(&self) -> &[u8] {
        &self.ext[..self.ext_len]
    }

    /// Bytes this value adds after the shared option header byte.
    pub fn encoded_len(&self) -> usize {
        self.ext_len
    }
}

/// Reads the value announced by a 4-bit `nibble`, consuming extension bytes from `cursor`.
pub(crate) fn decode_value(nibble: u8, cursor: &mut Cursor<'_>) -> Result<u16, CoapError> {
    match nibble {
        0..=12 => Ok(u16::from(nibble)),
        ONE_BYTE_NIBBLE => Ok(u16::from(cursor.read_u8()?) + ONE_BYTE_BASE),
        TWO_BYTE_NIBBLE => cursor
            .read_u16()?
            .checked_add(TWO_BYTE_BASE)
            .ok_or_else(|| Malformed::ValueOverflow.into()),
        _ => Err(Malformed::ReservedNibble.into()),
    }
}

/// Picks the shortest encoding for `value`.
pub fn encode_value(value: u16) -> Extended {
    if value < ONE_BYTE_BASE {
        Extended {
            nibble: value as u8,
            ext: [0; 2],
            ext_len: 0,
        }
    } else if value < TWO_BYTE_BASE {
        Extended {
            nibble: ONE_BYTE_NIBBLE,
            ext: [(value - ONE_BYTE_BASE) as u8, 0],
            ext_len: 1,
        }
    } else {
        Extended {
            nibble: TWO_BYTE_NIBBLE,
            ext: (value - TWO_BYTE_BASE).to_be_bytes(),
            ext_len: 2,
        }
    }
}

/// Network-order unsigned integer of up to four bytes, with leading zero bytes omitted.
pub fn decode_uint(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &byte| (acc << 8) | u32::from(byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: u16) -> u16 {
        let encoded = encode_value(value);
        let mut cursor = Cursor::new(encoded.extension());
        let decoded = decode_value(encoded.nibble(), &mut cursor).unwrap();
        assert_eq!(cursor.remaining(), 0, "extension not fully consumed for {value}");
        decoded
    }

    #[test]
    fn test_round_trip_all_values() {
        for value in 0..=u16::MAX {
            assert_eq!(round_trip(value), value);
        }
    }

    #[test]
    fn test_encoding_boundaries() {
        assert_eq!(encode_value(12).nibble(), 12);
        assert_eq!(encode_value(12).encoded_len(), 0);

        assert_eq!(encode_value(13).nibble(), 13);
        assert_eq!(encode_value(13).extension(), &[0]);
        assert_eq!(encode_value(268).extension(), &[255]);

        assert_eq!(encode_value(269).nibble(), 14);
        assert_eq!(encode_value(269).extension(), &[0, 0]);
        assert_eq!(encode_value(u16::MAX).extension(), &[0xfe, 0xf2]);
    }

    #[test]
    fn test_decode_errors() {
        let mut cursor = Cursor::new(&[]);
        assert_eq!(
            decode_value(13, &mut cursor),
            Err(CoapError::InsufficientData)
        );

        let mut cursor = Cursor::new(&[0x01]);
        assert_eq!(
            decode_value(14, &mut cursor),
            Err(CoapError::InsufficientData)
        );

        let mut cursor = Cursor::new(&[0xff, 0xff]);
        assert_eq!(
            decode_value(14, &mut cursor),
            Err(Malformed::ValueOverflow.into())
        );

        let mut cursor = Cursor::new(&[0x00]);
        assert_eq!(
            decode_value(15, &mut cursor),
            Err(Malformed::ReservedNibble.into())
        );
    }

    #[test]
    fn test_decode_uint() {
        assert_eq!(decode_uint(&[]), 0);
        assert_eq!(decode_uint(&[0x2a]), 42);
        assert_eq!(decode_uint(&[0x01, 0x00]), 256);
        assert_eq!(decode_uint(&[0x12, 0x34, 0x56]), 0x123456);
    }
}
