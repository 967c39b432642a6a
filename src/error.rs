use thiserror::Error;

use crate::codec::consts::Code;

/// Failure reported by the codec, the blockwise engine or the dispatcher.  Every variant is
/// reported synchronously to the immediate caller; nothing is retried and nothing is partially
/// committed.  A failed parse leaves no usable view, a failed build leaves the destination
/// buffer in an unspecified (but never out-of-bounds written) state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoapError {
    /// The input violates the RFC 7252 message format.  See [`Malformed`] for the reason.
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] Malformed),

    /// An extension field, token or option value would read past the end of the input.
    #[error("insufficient data: read past end of buffer")]
    InsufficientData,

    /// The destination cannot hold the header, option or reply being built.
    #[error("buffer too small: required {required} bytes, available {available}")]
    BufferTooSmall { required: usize, available: usize },

    /// Dispatch was invoked on a message whose code class is not 0 (request).
    #[error("not a request: code {0}")]
    NotARequest(Code),
}

/// Reason attached to [`CoapError::MalformedMessage`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    #[error("unsupported version {0}")]
    Version(u8),

    /// Nibble value 15 is only legal as part of the 0xFF payload marker.
    #[error("reserved nibble 15 in option header")]
    ReservedNibble,

    #[error("option number or length exceeds 65535")]
    ValueOverflow,

    #[error("unknown critical option {0}")]
    UnknownCriticalOption(u16),

    #[error("option {number} has invalid length {len}")]
    InvalidOptionLength { number: u16, len: usize },

    #[error("block size exponent {0} exceeds the maximum")]
    BlockSizeExponent(u8),

    #[error("uri path exceeds {0} bytes")]
    UrlTooLong(usize),

    #[error("payload marker not followed by a payload")]
    EmptyPayload,
}

impl CoapError {
    pub fn buffer_too_small(required: usize, available: usize) -> Self {
        Self::BufferTooSmall {
            required,
            available,
        }
    }

    /// True for errors caused by the peer's input rather than by local buffer sizing.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MalformedMessage(_) | Self::InsufficientData)
    }
}
