use std::fmt::Debug;
use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Sink, Stream};
use thiserror::Error;

/// Generalization of the underlying CoAP transport, intended primarily to make it easy to support a
/// wide range of datagram-like protocols while keeping the codec itself I/O free.
#[async_trait]
pub trait Transport {
    type Endpoint: Debug + Send + Clone;

    /// Perform the binding, that is, begin accepting new data from this transport even if
    /// there isn't yet a handler serving the data source yet.  We expect a continuous async
    /// stream of (datagram, Endpoint) pairs which distinguish each individual peer.
    async fn bind(self) -> Result<BoxedFramedBinding<Self::Endpoint>, TransportError>;
}

pub type BoxedFramedBinding<Endpoint> = Pin<Box<dyn FramedBinding<Endpoint>>>;

/// Trait generalizing a common feature of async libraries like tokio where a socket is exposed
/// as both a stream and a sink.  Items are whole datagrams; the codec runs above this layer.
pub trait FramedBinding<Endpoint>:
    Send
    + Stream<Item = Result<FramedItem<Endpoint>, FramedReadError<Endpoint>>>
    + Sink<OutboundItem<Endpoint>, Error = FramedWriteError>
{
    /// Access the link's MTU which is used to size reply buffers and the largest Block2 block
    /// to serve.  If it cannot be determined by the link, the RFC 7252 default applies.
    fn mtu(&self) -> Option<u32>;

    /// Address the binding actually listens on, useful after binding to port 0.
    fn local_endpoint(&self) -> Option<Endpoint>;
}

/// Raw datagram coming from a remote peer, as designated by [`Endpoint`].  Note that
/// the endpoint is delivered with each packet so that packet-oriented protocols can
/// avoid the leaky abstraction of a "connection" to a given Endpoint.
pub type FramedItem<Endpoint> = (BytesMut, Endpoint);

/// Reply datagram and its destination.
pub type OutboundItem<Endpoint> = (Bytes, Endpoint);

/// Error when receiving from a remote peer.  Note that here [`Endpoint`] is optional as there may
/// be a generic read error unrelated to any remote peer, for example if the underlying bound
/// socket is closed.
pub type FramedReadError<Endpoint> = (TransportError, Option<Endpoint>);

/// Error when sending to a remote peer.  Note that [`Endpoint`] is omitted in this case as the
/// endpoint is provided to the send APIs themselves so we can easily tell which peer generated
/// the error.
pub type FramedWriteError = TransportError;

/// Generalized errors indicating a range of transport-related issues such as being unable to
/// bind or a closed socket.  Most of these errors are non-fatal and the server can happily
/// continue serving other customers.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("generic I/O error: {0}")]
    IoError(#[from] io::Error),
}
