use anyhow::anyhow;
use log::debug;

use crate::block::{DEFAULT_MAX_BLOCK_EXPONENT, MAX_BLOCK_EXPONENT, MIN_BLOCK_EXPONENT};
use crate::codec::consts::{HEADER_LEN, MAX_TOKEN_LEN};

/// Default link MTU from RFC 7252 section 4.6, used to size reply buffers when the transport
/// does not report one.
pub const DEFAULT_MTU: usize = 1152;

/// Worst case non-body bytes in a blockwise reply: header and token, Content-Format (3),
/// Block2 (5), payload marker, and the spare byte [`crate::codec::build_reply`] requires.
pub const BLOCK_REPLY_OVERHEAD: usize = HEADER_LEN + MAX_TOKEN_LEN + 3 + 5 + 1 + 1;

/// Sizing knobs for reply generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    max_block_exponent: u8,
    response_buffer_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_block_exponent: DEFAULT_MAX_BLOCK_EXPONENT,
            response_buffer_size: DEFAULT_MTU,
        }
    }
}

impl CodecConfig {
    /// `max_block_size` must be a power of two between 16 and 1024, and a full block plus reply
    /// overhead has to fit `response_buffer_size`.
    pub fn new(max_block_size: usize, response_buffer_size: usize) -> anyhow::Result<Self> {
        if !max_block_size.is_power_of_two() {
            return Err(anyhow!("Invalid max_block_size={max_block_size}"));
        }
        let max_block_exponent = max_block_size.trailing_zeros() as u8;
        if !(MIN_BLOCK_EXPONENT..=MAX_BLOCK_EXPONENT).contains(&max_block_exponent) {
            return Err(anyhow!(
                "max_block_size={max_block_size} outside 16..=1024"
            ));
        }
        let required = max_block_size + BLOCK_REPLY_OVERHEAD;
        if response_buffer_size < required {
            return Err(anyhow!(
                "response_buffer_size={response_buffer_size} cannot hold a {max_block_size} byte block (needs {required})"
            ));
        }
        Ok(Self {
            max_block_exponent,
            response_buffer_size,
        })
    }

    /// Adopts the transport's MTU as the reply buffer size, shrinking the block size until a
    /// full block fits.
    pub fn with_mtu(mut self, mtu: Option<u32>) -> Self {
        let mtu = match mtu.and_then(|mtu| usize::try_from(mtu).ok()) {
            Some(mtu) => mtu,
            None => return self,
        };
        self.response_buffer_size = mtu;
        while self.max_block_exponent > MIN_BLOCK_EXPONENT
            && self.max_block_size() + BLOCK_REPLY_OVERHEAD > mtu
        {
            self.max_block_exponent -= 1;
        }
        debug!(
            "Link MTU {mtu}: serving blocks of up to {} bytes",
            self.max_block_size()
        );
        self
    }

    pub fn max_block_exponent(&self) -> u8 {
        self.max_block_exponent
    }

    pub fn max_block_size(&self) -> usize {
        1 << self.max_block_exponent
    }

    pub fn response_buffer_size(&self) -> usize {
        self.response_buffer_size
    }
}
