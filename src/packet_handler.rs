use crate::config::DEFAULT_MTU;

/// "Low-level" raw packet handler.  This is little more than a callback informing the user that
/// a datagram has arrived, with a buffer to write at most one reply datagram into.
///
/// Most customers should steer clear of this and build a [`crate::app::Router`] through
/// [`crate::app::new`] instead, which implements it.
pub trait PacketHandler<Endpoint>: Clone {
    /// Returns the length of the reply written to `response`, or `None` to send nothing.
    fn handle(&self, packet: &[u8], peer: &Endpoint, response: &mut [u8]) -> Option<usize>;

    /// Size of the `response` buffer the server allocates per datagram.
    fn response_buffer_size(&self) -> usize {
        DEFAULT_MTU
    }
}

pub trait IntoHandler<Handler, Endpoint>
where
    Handler: PacketHandler<Endpoint> + Send + 'static,
{
    fn into_handler(self, mtu: Option<u32>) -> Handler;
}

impl<Handler, Endpoint> IntoHandler<Handler, Endpoint> for Handler
where
    Handler: PacketHandler<Endpoint> + Send + 'static,
{
    fn into_handler(self, _mtu: Option<u32>) -> Handler {
        self
    }
}
