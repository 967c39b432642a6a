//! Compact CoAP ([RFC 7252](https://datatracker.ietf.org/doc/html/rfc7252)) codec, Block2
//! blockwise engine and request router, with an async UDP server on top.
//!
//! The codec works on borrowed buffers: [`codec::Message::parse`] validates a datagram in place
//! and the builders write replies into a caller-supplied slice.
//!
//! # Examples
//! ```no_run
//! use nanocoap::codec::{reply_simple, Code, Message};
//! use nanocoap::codec::consts::content_format::TEXT_PLAIN;
//! use nanocoap::{app, CoapError, CoapServer, FatalServerError, UdpTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), FatalServerError> {
//!     let server = CoapServer::bind(UdpTransport::new("0.0.0.0:5683")).await?;
//!     server.serve(
//!         app::new().resource(
//!             app::resource("/hello").get(handle_get_hello))
//!     ).await
//! }
//!
//! fn handle_get_hello(request: &Message<'_>, response: &mut [u8]) -> Result<usize, CoapError> {
//!     reply_simple(request, Code::CONTENT, response, TEXT_PLAIN, b"Hello, world")
//! }
//! ```

pub use error::{CoapError, Malformed};
pub use server::CoapServer;
pub use server::FatalServerError;
pub use udp::UdpTransport;

pub mod app;
pub mod block;
pub mod codec;
pub mod config;
pub mod error;
pub mod packet_handler;
pub mod server;
pub mod transport;
pub mod udp;
