use crate::codec::consts::{Code, MessageType, HEADER_LEN, PAYLOAD_MARKER, VERSION};
use crate::codec::message::Message;
use crate::codec::option::put_option_content_format;
use crate::error::CoapError;

/// Writes the fixed header and token at the start of `buf`, returning their combined length.
///
/// # Panics
///
/// The token length has to fit the 4-bit TKL field.
pub fn build_header(
    buf: &mut [u8],
    message_type: MessageType,
    token: &[u8],
    code: Code,
    message_id: u16,
) -> Result<usize, CoapError> {
    assert!(token.len() <= 0x0f, "token of {} bytes", token.len());
    let len = HEADER_LEN + token.len();
    if buf.len() < len {
        return Err(CoapError::buffer_too_small(len, buf.len()));
    }

    buf[0] = (VERSION << 6) | (message_type.bits() << 4) | token.len() as u8;
    buf[1] = code.0;
    buf[2..4].copy_from_slice(&message_id.to_be_bytes());
    buf[HEADER_LEN..len].copy_from_slice(token);
    Ok(len)
}

/// Message type answering `request` with `code`: an empty code rejects the message with Reset,
/// a Non-confirmable request gets a Non-confirmable response, anything else is piggybacked on an
/// Acknowledgement.
pub fn reply_type(request: &Message<'_>, code: Code) -> MessageType {
    if code.is_empty() {
        MessageType::Reset
    } else if request.message_type() == MessageType::NonConfirmable {
        MessageType::NonConfirmable
    } else {
        MessageType::Acknowledgement
    }
}

/// Writes the reply header for `request` into `buf`, echoing its token and message ID.  The
/// caller has already placed `payload_len` bytes of options and payload after the header.
/// Returns the total reply length.
pub fn build_reply(
    request: &Message<'_>,
    code: Code,
    buf: &mut [u8],
    payload_len: usize,
) -> Result<usize, CoapError> {
    let header_len = request.header_len();
    let required = header_len + payload_len + 1;
    if buf.len() < required {
        return Err(CoapError::buffer_too_small(required, buf.len()));
    }

    build_header(
        buf,
        reply_type(request, code),
        request.token().unwrap_or_default(),
        code,
        request.message_id(),
    )?;
    Ok(header_len + payload_len)
}

/// Complete reply carrying `payload` tagged with `content_format`.  An empty payload produces a
/// bare header.
pub fn reply_simple(
    request: &Message<'_>,
    code: Code,
    buf: &mut [u8],
    content_format: u16,
    payload: &[u8],
) -> Result<usize, CoapError> {
    let header_len = request.header_len();
    let mut payload_len = 0;

    if !payload.is_empty() {
        let available = buf.len();
        let body = buf
            .get_mut(header_len..)
            .ok_or_else(|| CoapError::buffer_too_small(header_len + 1, available))?;
        let mut pos = put_option_content_format(body, 0, content_format)?;
        let required = pos + 1 + payload.len();
        if body.len() < required {
            return Err(CoapError::buffer_too_small(header_len + required, available));
        }
        body[pos] = PAYLOAD_MARKER;
        pos += 1;
        body[pos..required].copy_from_slice(payload);
        payload_len = required;
    }

    build_reply(request, code, buf, payload_len)
}
