use core::fmt;

use heapless::Vec;
use log::{debug, trace};

use crate::block::Block2;
use crate::codec::consts::{
    is_critical, Code, MessageType, Methods, HEADER_LEN, OPT_BLOCK2, OPT_CONTENT_FORMAT,
    OPT_OBSERVE, OPT_URI_PATH, OPT_URI_QUERY, VERSION,
};
use crate::codec::cursor::Cursor;
use crate::codec::finder::{find_option, find_option_values};
use crate::codec::option::{CoapOption, OptionIter};
use crate::codec::value::decode_uint;
use crate::error::{CoapError, Malformed};

/// Capacity of the reconstructed request path, including the `/` separators.
pub const URL_MAX: usize = 64;

/// Read-only view of a CoAP message borrowed from the buffer it arrived in.
///
/// Construction validates the whole message: the header, the token bounds, every option record
/// and the payload marker.  Accessors therefore never fail.  The request path is the only part
/// copied out of the buffer, as Uri-Path options carry it in separate segments.
#[derive(Clone)]
pub struct Message<'a> {
    buf: &'a [u8],
    token: Option<&'a [u8]>,
    url: Vec<u8, URL_MAX>,
    options_offset: Option<usize>,
    options_end: usize,
    payload_offset: usize,
    has_payload_marker: bool,
    content_format: Option<u16>,
    observe: Option<u32>,
}

impl<'a> Message<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<Self, CoapError> {
        let mut cursor = Cursor::new(buf);
        let header = cursor.take(HEADER_LEN)?;
        let version = header[0] >> 6;
        if version != VERSION {
            return Err(Malformed::Version(version).into());
        }
        let token = cursor.take(usize::from(header[0] & 0x0f))?;
        let header_len = cursor.position();

        let mut msg = Self {
            buf,
            token: (!token.is_empty()).then_some(token),
            url: Vec::new(),
            options_offset: None,
            options_end: buf.len(),
            payload_offset: buf.len(),
            has_payload_marker: false,
            content_format: None,
            observe: None,
        };

        let mut options = OptionIter::new(&buf[header_len..]);
        for option in options.by_ref() {
            let option = option?;
            msg.options_offset.get_or_insert(header_len);
            msg.apply_option(&option)?;
        }

        let options_end = header_len + options.position();
        if options_end < buf.len() {
            // The iterator only stops short of the end on a payload marker.
            if options_end + 1 == buf.len() {
                return Err(Malformed::EmptyPayload.into());
            }
            msg.has_payload_marker = true;
            msg.payload_offset = options_end + 1;
        }
        msg.options_end = options_end;

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Parsed {:?} {} mid={} url={:?} payload={}B",
                msg.message_type(),
                msg.code(),
                msg.message_id(),
                msg.url_str(),
                msg.payload().len()
            );
        }
        Ok(msg)
    }

    fn apply_option(&mut self, option: &CoapOption<'a>) -> Result<(), CoapError> {
        match option.number {
            OPT_URI_PATH => self.push_path_segment(option.value)?,
            OPT_URI_QUERY => {}
            OPT_CONTENT_FORMAT => {
                // Longer values are not a format we know; leave content_format unset.
                if option.value.len() <= 2 {
                    self.content_format = Some(option.value_uint() as u16);
                }
            }
            OPT_OBSERVE => self.observe = Some(short_uint(option)?),
            OPT_BLOCK2 => {
                Block2::from_value(short_uint(option)?)?;
            }
            number if is_critical(number) => {
                return Err(Malformed::UnknownCriticalOption(number).into());
            }
            number => trace!("Skipping elective option {number}"),
        }
        Ok(())
    }

    fn push_path_segment(&mut self, segment: &[u8]) -> Result<(), CoapError> {
        let len = self.url.len() + 1 + segment.len();
        self.url.push(b'/').map_err(|_| Malformed::UrlTooLong(len))?;
        self.url
            .extend_from_slice(segment)
            .map_err(|_| Malformed::UrlTooLong(len))?;
        Ok(())
    }

    pub fn version(&self) -> u8 {
        self.buf[0] >> 6
    }

    pub fn message_type(&self) -> MessageType {
        MessageType::from_bits(self.buf[0] >> 4)
    }

    pub fn token_len(&self) -> usize {
        usize::from(self.buf[0] & 0x0f)
    }

    pub fn token(&self) -> Option<&'a [u8]> {
        self.token
    }

    pub fn code(&self) -> Code {
        Code(self.buf[1])
    }

    pub fn message_id(&self) -> u16 {
        u16::from_be_bytes([self.buf[2], self.buf[3]])
    }

    /// Fixed header plus token.
    pub fn header_len(&self) -> usize {
        HEADER_LEN + self.token_len()
    }

    /// Request path rebuilt from the Uri-Path options, `/` before every segment.  Empty when the
    /// message has no Uri-Path.  Segments are kept as raw bytes without percent-decoding.
    pub fn url(&self) -> &[u8] {
        &self.url
    }

    pub fn url_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.url).ok()
    }

    /// The option records, not including the payload marker.
    pub fn options(&self) -> &'a [u8] {
        &self.buf[self.options_offset.unwrap_or(self.options_end)..self.options_end]
    }

    /// Offset of the first option record, `None` if the message has none.
    pub fn options_offset(&self) -> Option<usize> {
        self.options_offset
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.buf[self.payload_offset..]
    }

    /// Offset of the payload; equal to the buffer length when there is no payload marker.
    pub fn payload_offset(&self) -> usize {
        self.payload_offset
    }

    pub fn has_payload_marker(&self) -> bool {
        self.has_payload_marker
    }

    pub fn content_format(&self) -> Option<u16> {
        self.content_format
    }

    pub fn observe(&self) -> Option<u32> {
        self.observe
    }

    /// The Block2 option, re-read from the option records.
    pub fn block2(&self) -> Option<Block2> {
        find_option(self.options(), OPT_BLOCK2)
            .and_then(|option| Block2::from_value(option.value_uint()).ok())
    }

    /// Uri-Query values in message order.
    pub fn queries(&self) -> impl Iterator<Item = &'a [u8]> {
        find_option_values(self.options(), OPT_URI_QUERY)
    }

    pub fn is_request(&self) -> bool {
        self.code().is_request()
    }

    pub fn method(&self) -> Methods {
        Methods::from_code(self.code())
    }
}

/// Observe and Block2 carry at most three value bytes.
fn short_uint(option: &CoapOption<'_>) -> Result<u32, CoapError> {
    if option.value.len() >= 4 {
        return Err(Malformed::InvalidOptionLength {
            number: option.number,
            len: option.value.len(),
        }
        .into());
    }
    Ok(decode_uint(option.value))
}

impl fmt::Debug for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("type", &self.message_type())
            .field("code", &self.code())
            .field("message_id", &self.message_id())
            .field("token", &self.token)
            .field("url", &self.url_str())
            .field("content_format", &self.content_format)
            .field("observe", &self.observe)
            .field("payload_len", &self.payload().len())
            .finish()
    }
}
