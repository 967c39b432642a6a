//! Zero-copy CoAP message codec.  Parsing borrows the datagram buffer, building writes into a
//! caller-supplied buffer; nothing here allocates.

pub use builder::{build_header, build_reply, reply_simple, reply_type};
pub use consts::{Code, MessageType, Methods};
pub use finder::{find_option, find_option_range, find_option_values};
pub use message::{Message, URL_MAX};
pub use option::{
    put_option, put_option_block2, put_option_content_format, put_option_uri, CoapOption,
    OptionIter,
};
pub use value::{decode_uint, encode_value, Extended};

pub mod builder;
pub mod consts;
pub(crate) mod cursor;
pub mod finder;
pub mod message;
pub mod option;
pub mod value;
