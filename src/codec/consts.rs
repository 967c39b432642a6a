//! Protocol constants from [RFC 7252](https://datatracker.ietf.org/doc/html/rfc7252) and
//! [RFC 7959](https://datatracker.ietf.org/doc/html/rfc7959).

use core::fmt;
use core::ops::BitOr;

/// The only protocol version this codec speaks.
pub const VERSION: u8 = 1;

/// Fixed header: Ver/T/TKL, Code, Message ID.
pub const HEADER_LEN: usize = 4;

/// Largest token RFC 7252 allows.  Longer TKL values are only bounds-checked.
pub const MAX_TOKEN_LEN: usize = 8;

/// Separates the option sequence from the payload.
pub const PAYLOAD_MARKER: u8 = 0xff;

/// The standard default port for CoAP-over-UDP.
pub const DEFAULT_PORT: u16 = 5683;

/// Path of the resource discovery listing (RFC 6690).
pub const WELL_KNOWN_CORE: &str = "/.well-known/core";

pub const OPT_URI_HOST: u16 = 3;
pub const OPT_OBSERVE: u16 = 6;
pub const OPT_URI_PORT: u16 = 7;
pub const OPT_URI_PATH: u16 = 11;
pub const OPT_CONTENT_FORMAT: u16 = 12;
pub const OPT_URI_QUERY: u16 = 15;
pub const OPT_ACCEPT: u16 = 17;
pub const OPT_BLOCK2: u16 = 23;
pub const OPT_BLOCK1: u16 = 27;
pub const OPT_SIZE2: u16 = 28;

/// Options whose number has the low bit set must be understood or the message rejected.
pub const fn is_critical(number: u16) -> bool {
    number & 1 == 1
}

/// Registered Content-Format identifiers.
pub mod content_format {
    pub const TEXT_PLAIN: u16 = 0;
    pub const LINK_FORMAT: u16 = 40;
    pub const XML: u16 = 41;
    pub const OCTET_STREAM: u16 = 42;
    pub const EXI: u16 = 47;
    pub const JSON: u16 = 50;
    pub const CBOR: u16 = 60;
}

/// Two-bit message type field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    Confirmable,
    NonConfirmable,
    Acknowledgement,
    Reset,
}

impl MessageType {
    /// Decodes the low two bits of `bits`; every value maps to a type.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => Self::Confirmable,
            1 => Self::NonConfirmable,
            2 => Self::Acknowledgement,
            _ => Self::Reset,
        }
    }

    pub const fn bits(self) -> u8 {
        match self {
            Self::Confirmable => 0,
            Self::NonConfirmable => 1,
            Self::Acknowledgement => 2,
            Self::Reset => 3,
        }
    }
}

/// Request method or response status, packed as `class << 5 | detail`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Code(pub u8);

impl Code {
    pub const EMPTY: Code = Code::new(0, 0);

    pub const GET: Code = Code::new(0, 1);
    pub const POST: Code = Code::new(0, 2);
    pub const PUT: Code = Code::new(0, 3);
    pub const DELETE: Code = Code::new(0, 4);
    pub const FETCH: Code = Code::new(0, 5);
    pub const PATCH: Code = Code::new(0, 6);
    pub const IPATCH: Code = Code::new(0, 7);

    pub const CREATED: Code = Code::new(2, 1);
    pub const DELETED: Code = Code::new(2, 2);
    pub const VALID: Code = Code::new(2, 3);
    pub const CHANGED: Code = Code::new(2, 4);
    pub const CONTENT: Code = Code::new(2, 5);
    pub const CONTINUE: Code = Code::new(2, 31);

    pub const BAD_REQUEST: Code = Code::new(4, 0);
    pub const UNAUTHORIZED: Code = Code::new(4, 1);
    pub const BAD_OPTION: Code = Code::new(4, 2);
    pub const FORBIDDEN: Code = Code::new(4, 3);
    pub const NOT_FOUND: Code = Code::new(4, 4);
    pub const METHOD_NOT_ALLOWED: Code = Code::new(4, 5);
    pub const NOT_ACCEPTABLE: Code = Code::new(4, 6);
    pub const REQUEST_ENTITY_INCOMPLETE: Code = Code::new(4, 8);
    pub const PRECONDITION_FAILED: Code = Code::new(4, 12);
    pub const REQUEST_ENTITY_TOO_LARGE: Code = Code::new(4, 13);
    pub const UNSUPPORTED_CONTENT_FORMAT: Code = Code::new(4, 15);

    pub const INTERNAL_SERVER_ERROR: Code = Code::new(5, 0);
    pub const NOT_IMPLEMENTED: Code = Code::new(5, 1);
    pub const BAD_GATEWAY: Code = Code::new(5, 2);
    pub const SERVICE_UNAVAILABLE: Code = Code::new(5, 3);
    pub const GATEWAY_TIMEOUT: Code = Code::new(5, 4);
    pub const PROXYING_NOT_SUPPORTED: Code = Code::new(5, 5);

    pub const fn new(class: u8, detail: u8) -> Self {
        Self((class << 5) | (detail & 0x1f))
    }

    pub const fn class(self) -> u8 {
        self.0 >> 5
    }

    pub const fn detail(self) -> u8 {
        self.0 & 0x1f
    }

    /// Class 0 covers both the request methods and the empty (ping) message.
    pub const fn is_request(self) -> bool {
        self.class() == 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.class(), self.detail())
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({self})")
    }
}

/// Bitmask of request methods a resource accepts.  Bit `n - 1` stands for method detail `n`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Methods(u8);

impl Methods {
    pub const NONE: Methods = Methods(0);
    pub const GET: Methods = Methods(1 << 0);
    pub const POST: Methods = Methods(1 << 1);
    pub const PUT: Methods = Methods(1 << 2);
    pub const DELETE: Methods = Methods(1 << 3);
    pub const FETCH: Methods = Methods(1 << 4);
    pub const PATCH: Methods = Methods(1 << 5);
    pub const IPATCH: Methods = Methods(1 << 6);
    pub const ALL: Methods = Methods(0x7f);

    /// Flag for a request code; anything that is not a known method maps to [`Methods::NONE`].
    pub const fn from_code(code: Code) -> Self {
        match (code.class(), code.detail()) {
            (0, detail @ 1..=7) => Methods(1 << (detail - 1)),
            _ => Methods::NONE,
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn intersects(self, other: Methods) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Methods {
    type Output = Methods;

    fn bitor(self, rhs: Self) -> Self {
        Methods(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_packing() {
        assert_eq!(Code::CONTENT.0, 0x45);
        assert_eq!(Code::NOT_FOUND.0, 0x84);
        assert_eq!(Code::INTERNAL_SERVER_ERROR.0, 0xa0);
        assert_eq!(Code::CONTENT.to_string(), "2.05");
        assert_eq!(Code::CONTINUE.to_string(), "2.31");
        assert!(Code::EMPTY.is_request());
        assert!(Code::EMPTY.is_empty());
        assert!(!Code::CONTENT.is_request());
    }

    #[test]
    fn test_method_flags() {
        assert_eq!(Methods::from_code(Code::GET), Methods::GET);
        assert_eq!(Methods::from_code(Code::IPATCH), Methods::IPATCH);
        assert_eq!(Methods::from_code(Code::EMPTY), Methods::NONE);
        assert_eq!(Methods::from_code(Code::new(0, 8)), Methods::NONE);
        assert_eq!(Methods::from_code(Code::CONTENT), Methods::NONE);

        let get_put = Methods::GET | Methods::PUT;
        assert!(get_put.intersects(Methods::PUT));
        assert!(!get_put.intersects(Methods::POST));
        assert!(!Methods::ALL.intersects(Methods::NONE));
    }

    #[test]
    fn test_message_type_bits() {
        for bits in 0..4 {
            assert_eq!(MessageType::from_bits(bits).bits(), bits);
        }
        assert_eq!(MessageType::from_bits(0x6), MessageType::Acknowledgement);
    }

    #[test]
    fn test_critical_bit() {
        assert!(is_critical(OPT_URI_PATH));
        assert!(is_critical(OPT_BLOCK2));
        assert!(!is_critical(OPT_CONTENT_FORMAT));
        assert!(!is_critical(OPT_OBSERVE));
    }
}
