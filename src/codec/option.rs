//! Option TLV engine: parsing one option record at a time and building option records into a
//! reply buffer.

use core::ops::Range;

use crate::block::{BlockWindow, BLOCK_NUM_SHIFT, MIN_BLOCK_EXPONENT};
use crate::codec::consts::{OPT_BLOCK2, OPT_CONTENT_FORMAT, OPT_URI_PATH, PAYLOAD_MARKER};
use crate::codec::cursor::Cursor;
use crate::codec::value::{decode_uint, decode_value, encode_value, RESERVED_NIBBLE};
use crate::error::{CoapError, Malformed};

/// One option record borrowed from the buffer it was parsed out of.  Offsets are relative to
/// the option sequence that was scanned, not to the whole message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoapOption<'a> {
    /// Absolute option number (running sum of deltas).
    pub number: u16,
    pub delta: u16,
    pub value: &'a [u8],
    /// Offset of the record's first byte.
    pub offset: usize,
    /// Offset of the first value byte.
    pub value_offset: usize,
}

impl<'a> CoapOption<'a> {
    pub fn value_range(&self) -> Range<usize> {
        self.value_offset..self.value_offset + self.value.len()
    }

    /// Header, extension and value bytes together.
    pub fn encoded_len(&self) -> usize {
        self.value_range().end - self.offset
    }

    pub fn value_uint(&self) -> u32 {
        decode_uint(self.value)
    }
}

/// Parses the record under `cursor`.  `previous` is the absolute number of the option before it.
pub(crate) fn parse_option<'a>(
    cursor: &mut Cursor<'a>,
    previous: u16,
) -> Result<CoapOption<'a>, CoapError> {
    let offset = cursor.position();
    let first = cursor.read_u8()?;
    let (delta_nibble, len_nibble) = (first >> 4, first & 0x0f);
    if delta_nibble == RESERVED_NIBBLE || len_nibble == RESERVED_NIBBLE {
        return Err(Malformed::ReservedNibble.into());
    }

    let delta = decode_value(delta_nibble, cursor)?;
    let len = decode_value(len_nibble, cursor)?;
    let value_offset = cursor.position();
    let value = cursor.take(usize::from(len))?;
    let number = previous
        .checked_add(delta)
        .ok_or(Malformed::ValueOverflow)?;

    Ok(CoapOption {
        number,
        delta,
        value,
        offset,
        value_offset,
    })
}

/// Walks an option sequence, yielding records with absolute numbers until the slice ends or a
/// payload marker is reached.  The first error is yielded once and ends the iteration.
#[derive(Debug, Clone)]
pub struct OptionIter<'a> {
    cursor: Cursor<'a>,
    number: u16,
    done: bool,
}

impl<'a> OptionIter<'a> {
    pub fn new(options: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(options),
            number: 0,
            done: false,
        }
    }

    /// Offset just past the last record yielded; on a payload marker this is the marker itself.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }
}

impl<'a> Iterator for OptionIter<'a> {
    type Item = Result<CoapOption<'a>, CoapError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.peek() {
            None | Some(PAYLOAD_MARKER) => {
                self.done = true;
                None
            }
            Some(_) => {
                let result = parse_option(&mut self.cursor, self.number);
                match &result {
                    Ok(option) => self.number = option.number,
                    Err(_) => self.done = true,
                }
                Some(result)
            }
        }
    }
}

/// Writes option `number` with `value` at the start of `buf`, delta-encoded against
/// `previous`.  Returns the bytes written.
///
/// # Panics
///
/// Options must be written in ascending order; `previous > number` is a caller bug.
pub fn put_option(
    buf: &mut [u8],
    previous: u16,
    number: u16,
    value: &[u8],
) -> Result<usize, CoapError> {
    assert!(
        previous <= number,
        "option {number} written after option {previous}"
    );
    let len = u16::try_from(value.len()).map_err(|_| Malformed::ValueOverflow)?;
    let delta = encode_value(number - previous);
    let length = encode_value(len);

    let required = 1 + delta.encoded_len() + length.encoded_len() + value.len();
    if buf.len() < required {
        return Err(CoapError::buffer_too_small(required, buf.len()));
    }

    buf[0] = (delta.nibble() << 4) | length.nibble();
    let mut pos = 1;
    for part in [delta.extension(), length.extension(), value] {
        buf[pos..pos + part.len()].copy_from_slice(part);
        pos += part.len();
    }
    Ok(pos)
}

/// Content-Format as a 0, 1 or 2 byte unsigned integer.
pub fn put_option_content_format(
    buf: &mut [u8],
    previous: u16,
    content_format: u16,
) -> Result<usize, CoapError> {
    let bytes = content_format.to_be_bytes();
    let value = match content_format {
        0 => &bytes[2..],
        1..=0xff => &bytes[1..],
        _ => &bytes[..],
    };
    put_option(buf, previous, OPT_CONTENT_FORMAT, value)
}

/// Block2 option describing `window`, without the "more" flag (see
/// [`BlockWindow::finish_block2`]).  The value uses the fewest bytes that hold the block number.
pub fn put_option_block2(
    buf: &mut [u8],
    previous: u16,
    window: &BlockWindow,
) -> Result<usize, CoapError> {
    let szx = u32::from(window.exponent() - MIN_BLOCK_EXPONENT);
    let number = window.number();
    let len = if number > 0xfff {
        3
    } else if number > 0xf {
        2
    } else {
        1
    };
    let raw = ((number << BLOCK_NUM_SHIFT) | szx).to_be_bytes();
    put_option(buf, previous, OPT_BLOCK2, &raw[raw.len() - len..])
}

/// Splits `uri` into one option per non-empty segment.  Uri-Path segments are separated by `/`,
/// any other option (Uri-Query in practice) by `&`.
pub fn put_option_uri(
    buf: &mut [u8],
    previous: u16,
    uri: &str,
    number: u16,
) -> Result<usize, CoapError> {
    let separator = if number == OPT_URI_PATH { '/' } else { '&' };
    let mut previous = previous;
    let mut pos = 0;
    for segment in uri.split(separator).filter(|s| !s.is_empty()) {
        pos += put_option(&mut buf[pos..], previous, number, segment.as_bytes())?;
        previous = number;
    }
    Ok(pos)
}
