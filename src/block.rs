//! Block-wise response transfer ([RFC 7959](https://datatracker.ietf.org/doc/html/rfc7959)),
//! server side, Block2 only.
//!
//! A handler generates its whole response body on every request and streams it through a
//! [`BlockWindow`].  Only the bytes inside the window requested by the client are copied into the
//! reply; everything else is counted and discarded, so the total body length is known at the end
//! and the "more" flag can be set without buffering the body.

use core::cmp::{max, min};
use core::ops::Range;

use log::debug;

use crate::codec::consts::{Code, OPT_BLOCK2, OPT_CONTENT_FORMAT, PAYLOAD_MARKER};
use crate::codec::finder::find_option_range;
use crate::codec::{build_reply, put_option_block2, put_option_content_format, Message};
use crate::error::{CoapError, Malformed};

pub const BLOCK_NUM_SHIFT: u32 = 4;
pub const BLOCK_MORE_FLAG: u8 = 0x08;
pub const BLOCK_SZX_MASK: u32 = 0x07;

/// Block size exponent for SZX 0 (16 bytes).
pub const MIN_BLOCK_EXPONENT: u8 = 4;

/// Block size exponent for SZX 6 (1024 bytes).  SZX 7 is reserved.
pub const MAX_BLOCK_EXPONENT: u8 = 10;

/// 128 byte blocks unless configured otherwise.
pub const DEFAULT_MAX_BLOCK_EXPONENT: u8 = 7;

/// Decoded Block2 option value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Block2 {
    pub number: u32,
    pub more: bool,
    pub exponent: u8,
}

impl Block2 {
    pub fn from_value(value: u32) -> Result<Self, CoapError> {
        let exponent = (value & BLOCK_SZX_MASK) as u8 + MIN_BLOCK_EXPONENT;
        if exponent > MAX_BLOCK_EXPONENT {
            return Err(Malformed::BlockSizeExponent(exponent).into());
        }
        Ok(Self {
            number: value >> BLOCK_NUM_SHIFT,
            more: value & u32::from(BLOCK_MORE_FLAG) != 0,
            exponent,
        })
    }

    pub fn value(&self) -> u32 {
        let more = if self.more {
            u32::from(BLOCK_MORE_FLAG)
        } else {
            0
        };
        (self.number << BLOCK_NUM_SHIFT) | more | u32::from(self.exponent - MIN_BLOCK_EXPONENT)
    }

    pub fn size(&self) -> usize {
        1 << self.exponent
    }
}

/// Byte range `[start, end)` of the logical response body that belongs in this reply, plus the
/// running count of body bytes produced so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockWindow {
    start: usize,
    end: usize,
    cursor: usize,
    exponent: u8,
}

impl BlockWindow {
    /// Window over block `number` of `2^exponent` bytes.  The exponent is clamped to the range
    /// SZX can express, 4..=10.
    pub fn new(number: u32, exponent: u8) -> Self {
        let exponent = exponent.clamp(MIN_BLOCK_EXPONENT, MAX_BLOCK_EXPONENT);
        let start = (number as usize) << exponent;
        Self {
            start,
            end: start + (1 << exponent),
            cursor: 0,
            exponent,
        }
    }

    /// Window asked for by `request`, with the block size clamped to `2^max_exponent` (itself
    /// clamped to 16..=1024 bytes).  A request
    /// without Block2 gets block 0.
    pub fn from_request(request: &Message<'_>, max_exponent: u8) -> Self {
        match request.block2() {
            Some(block) => {
                let window = Self::new(block.number, min(block.exponent, max_exponent));
                debug!(
                    "Block2 request: num={} size={} (serving size {})",
                    block.number,
                    block.size(),
                    window.size()
                );
                window
            }
            None => Self::new(0, max_exponent),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Body bytes produced so far, inside and outside the window.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn size(&self) -> usize {
        self.end - self.start
    }

    pub fn exponent(&self) -> u8 {
        self.exponent
    }

    pub fn number(&self) -> u32 {
        (self.start >> self.exponent) as u32
    }

    /// Whether the body continues past this block.
    pub fn has_more(&self) -> bool {
        self.cursor > self.end
    }

    /// Where the next `len` body bytes land: the offset within the block and the sub-range of
    /// the input that falls inside the window, if any.
    fn overlap(&self, len: usize) -> Option<(usize, Range<usize>)> {
        let lo = max(self.cursor, self.start);
        let hi = min(self.cursor + len, self.end);
        (lo < hi).then(|| (lo - self.start, lo - self.cursor..hi - self.cursor))
    }

    /// Accounts for `len` body bytes and returns the part of them to copy, as
    /// `(offset in block, range of the input)`.
    pub fn advance(&mut self, len: usize) -> Option<(usize, Range<usize>)> {
        let overlap = self.overlap(len);
        self.cursor += len;
        overlap
    }

    pub fn put_char(&mut self, out: &mut [u8], c: u8) -> Result<(), CoapError> {
        self.put_bytes(out, &[c])
    }

    pub fn put_str(&mut self, out: &mut [u8], s: &str) -> Result<(), CoapError> {
        self.put_bytes(out, s.as_bytes())
    }

    /// Copies the in-window part of `bytes` to `out`, which holds the current block.
    pub fn put_bytes(&mut self, out: &mut [u8], bytes: &[u8]) -> Result<(), CoapError> {
        if let Some((dst, src)) = self.overlap(bytes.len()) {
            let required = dst + src.len();
            if out.len() < required {
                return Err(CoapError::buffer_too_small(required, out.len()));
            }
            out[dst..required].copy_from_slice(&bytes[src]);
        }
        self.cursor += bytes.len();
        Ok(())
    }

    /// Bytes of this block produced so far.
    pub fn written(&self) -> usize {
        min(self.cursor, self.end).saturating_sub(self.start)
    }

    /// Sets the "more" flag on the Block2 option found in `options` when the body ran past this
    /// window.  Returns false when there is no Block2 option to update.
    pub fn finish_block2(&self, options: &mut [u8]) -> bool {
        match find_option_range(options, OPT_BLOCK2) {
            Some(range) if !range.is_empty() => {
                if self.has_more() {
                    options[range.end - 1] |= BLOCK_MORE_FLAG;
                }
                true
            }
            _ => {
                debug!("No Block2 option to finish");
                false
            }
        }
    }
}

/// A [`BlockWindow`] bound to the slice that receives the current block.  Checking the slice
/// once up front lets producers write without handling errors on every call.
#[derive(Debug)]
pub struct BlockWriter<'b> {
    window: BlockWindow,
    out: &'b mut [u8],
}

impl<'b> BlockWriter<'b> {
    pub fn new(window: BlockWindow, out: &'b mut [u8]) -> Result<Self, CoapError> {
        if out.len() < window.size() {
            return Err(CoapError::buffer_too_small(window.size(), out.len()));
        }
        Ok(Self { window, out })
    }

    pub fn put_char(&mut self, c: u8) {
        self.put_bytes(&[c]);
    }

    pub fn put_str(&mut self, s: &str) {
        self.put_bytes(s.as_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        if let Some((dst, src)) = self.window.advance(bytes.len()) {
            self.out[dst..dst + src.len()].copy_from_slice(&bytes[src]);
        }
    }

    pub fn written(&self) -> usize {
        self.window.written()
    }

    /// Releases the output slice, handing back the window for [`BlockWindow::finish_block2`].
    pub fn finish(self) -> BlockWindow {
        self.window
    }
}

/// Builds a complete reply carrying the block of the body that `request` asks for.
///
/// `body` produces the whole body through the [`BlockWriter`] it is handed; the reply gets
/// `content_format`, a Block2 option describing the window (with "more" set when the body ran
/// past it) and the in-window bytes as payload.  Blocks are at most `2^max_exponent` bytes; an
/// exponent outside 4..=10 is clamped into that range.
pub fn reply_block2<F>(
    request: &Message<'_>,
    code: Code,
    response: &mut [u8],
    content_format: u16,
    max_exponent: u8,
    body: F,
) -> Result<usize, CoapError>
where
    F: FnOnce(&mut BlockWriter<'_>),
{
    let header_len = request.header_len();
    let available = response.len();
    let window = BlockWindow::from_request(request, max_exponent);

    let rest = response
        .get_mut(header_len..)
        .ok_or_else(|| CoapError::buffer_too_small(header_len + 1, available))?;
    let mut options_len = put_option_content_format(rest, 0, content_format)?;
    options_len += put_option_block2(&mut rest[options_len..], OPT_CONTENT_FORMAT, &window)?;
    if rest.len() <= options_len {
        return Err(CoapError::buffer_too_small(
            header_len + options_len + 1,
            available,
        ));
    }
    rest[options_len] = PAYLOAD_MARKER;

    let (options, block) = rest.split_at_mut(options_len + 1);
    let mut writer = BlockWriter::new(window, block)?;
    body(&mut writer);
    let written = writer.written();
    writer.finish().finish_block2(&mut options[..options_len]);

    // A block past the end of the body carries no payload, so no marker either.
    let payload_len = match written {
        0 => options_len,
        n => options_len + 1 + n,
    };
    build_reply(request, code, response, payload_len)
}
