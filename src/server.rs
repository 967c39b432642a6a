use std::fmt::Debug;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use log::{error, trace, warn};
use thiserror::Error;

use crate::packet_handler::{IntoHandler, PacketHandler};
use crate::transport::{
    BoxedFramedBinding, FramedItem, FramedReadError, Transport, TransportError,
};

/// Primary server API to configure, bind, and ultimately run the CoAP server.
pub struct CoapServer<Handler, Endpoint> {
    binding: BoxedFramedBinding<Endpoint>,
    handler: Option<Handler>,
}

impl<Handler, Endpoint: Debug + Send + Clone + 'static> CoapServer<Handler, Endpoint>
where
    Handler: PacketHandler<Endpoint> + Send + 'static,
{
    /// Bind the server to a specific source of incoming packets in a transport-agnostic way.  Most
    /// customers will wish to use [`crate::udp::UdpTransport`].
    pub async fn bind<T: Transport<Endpoint = Endpoint>>(
        transport: T,
    ) -> Result<Self, TransportError> {
        let binding = transport.bind().await?;
        Ok(Self {
            binding,
            handler: None,
        })
    }

    /// Where the bound transport listens, if it can tell.
    pub fn local_endpoint(&self) -> Option<Endpoint> {
        self.binding.local_endpoint()
    }

    /// Run the server until the transport closes.  Datagrams are handled one at a time: parse,
    /// dispatch into a fresh reply buffer, send.  The function returns a fatal error only for
    /// transport failures not tied to a specific peer, or programmer error in this crate.
    pub async fn serve(
        mut self,
        handler: impl IntoHandler<Handler, Endpoint>,
    ) -> Result<(), FatalServerError> {
        let mtu = self.binding.mtu();
        self.handler = Some(handler.into_handler(mtu));

        while let Some(event) = self.binding.next().await {
            self.handle_rx_event(event).await?;
        }
        Ok(())
    }

    async fn handle_rx_event(
        &mut self,
        result: Result<FramedItem<Endpoint>, FramedReadError<Endpoint>>,
    ) -> Result<(), FatalServerError> {
        match result {
            Ok((packet, peer)) => {
                trace!("Incoming packet from {peer:?}: {} bytes", packet.len());
                self.do_handle_request(&packet, peer).await?
            }
            Err((transport_err, peer)) => {
                warn!("Error from {peer:?}: {transport_err}");
                if peer.is_none() {
                    return Err(transport_err.into());
                }
            }
        }

        Ok(())
    }

    async fn do_handle_request(
        &mut self,
        packet: &[u8],
        peer: Endpoint,
    ) -> Result<(), FatalServerError> {
        let response = match self.generate_reply(packet, &peer)? {
            Some(response) => response,
            None => {
                trace!("No reply for {peer:?}");
                return Ok(());
            }
        };

        trace!("Outgoing packet to {peer:?}: {} bytes", response.len());
        if let Err(e) = self.binding.send((response, peer.clone())).await {
            error!("Error sending to {peer:?}: {e}");
        }
        Ok(())
    }

    fn generate_reply(
        &self,
        packet: &[u8],
        peer: &Endpoint,
    ) -> Result<Option<Bytes>, FatalServerError> {
        let handler = self
            .handler
            .as_ref()
            .ok_or_else(|| FatalServerError::InternalError("handler not set".to_string()))?;

        let mut response = vec![0u8; handler.response_buffer_size()];
        let len = match handler.handle(packet, peer, &mut response) {
            Some(len) => len,
            None => return Ok(None),
        };
        if len > response.len() {
            return Err(FatalServerError::InternalError(format!(
                "reply of {len} bytes overran {} byte buffer",
                response.len()
            )));
        }
        response.truncate(len);
        Ok(Some(Bytes::from(response)))
    }
}

/// Fatal error preventing the server from starting or continuing.  Typically the result of
/// programmer error or misconfiguration.
#[derive(Error, Debug)]
pub enum FatalServerError {
    /// Programmer error within this crate, file a bug!
    #[error("internal error: {0}")]
    InternalError(String),

    /// Transport error that is not related to any individual peer but would prevent any future
    /// packet exchanges on the transport.  Must abort the server.
    #[error("fatal transport error: {0}")]
    Transport(#[from] TransportError),
}
