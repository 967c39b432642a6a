use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Sink, Stream};
use log::debug;
use pin_project::pin_project;
use tokio::net::{ToSocketAddrs, UdpSocket};
use tokio_util::codec::BytesCodec;
use tokio_util::udp::UdpFramed;

use crate::transport::{
    BoxedFramedBinding, FramedBinding, FramedItem, FramedReadError, OutboundItem, Transport,
    TransportError,
};

/// "All CoAP Nodes" IPv4 group (RFC 7252 section 12.8).
pub const ALL_COAP_NODES_V4: Ipv4Addr = Ipv4Addr::new(224, 0, 1, 187);

/// "All CoAP Nodes" IPv6 link-local group.
pub const ALL_COAP_NODES_V6_LINK_LOCAL: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfd);

/// "All CoAP Nodes" IPv6 site-local group.
pub const ALL_COAP_NODES_V6_SITE_LOCAL: Ipv6Addr = Ipv6Addr::new(0xff05, 0, 0, 0, 0, 0, 0, 0xfd);

/// Plain RFC 7252 transport: one UDP socket, one datagram per message.
pub struct UdpTransport<A: ToSocketAddrs> {
    addresses: A,
    mtu: Option<u32>,
    multicast: bool,
    multicast_config: MulticastConfig,
}

/// Group to join after binding, with an optional interface override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MulticastGroup {
    V4 {
        group: Ipv4Addr,
        interface: Option<Ipv4Addr>,
    },
    V6 {
        group: Ipv6Addr,
        interface: Option<u32>,
    },
}

#[derive(Debug, Clone, Default)]
struct MulticastConfig {
    groups: Vec<MulticastGroup>,
    interface_v4: Option<Ipv4Addr>,
    interface_v6: Option<u32>,
}

impl<A: ToSocketAddrs> UdpTransport<A> {
    pub fn new(addresses: A) -> Self {
        Self {
            addresses,
            mtu: None,
            multicast: false,
            multicast_config: MulticastConfig::default(),
        }
    }

    /// Link MTU, used to size reply buffers and cap the Block2 block size.
    pub fn set_mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    /// Join the "All CoAP Nodes" groups for the bound address family after binding, unless
    /// groups are given with [`UdpTransport::join_multicast_group`].
    pub fn enable_multicast(mut self) -> Self {
        self.multicast = true;
        self
    }

    /// Join `group` instead of the "All CoAP Nodes" defaults.  Implies
    /// [`UdpTransport::enable_multicast`].
    pub fn join_multicast_group(mut self, group: MulticastGroup) -> Self {
        self.multicast = true;
        self.multicast_config.groups.push(group);
        self
    }

    /// Interface for IPv4 groups without their own.  Defaults to the bound address.  Has no
    /// effect unless multicast is enabled.
    pub fn set_multicast_interface_v4(mut self, interface: Ipv4Addr) -> Self {
        self.multicast_config.interface_v4 = Some(interface);
        self
    }

    /// Interface index for IPv6 groups without their own.  Defaults to 0 (any).  Has no effect
    /// unless multicast is enabled.
    pub fn set_multicast_interface_v6(mut self, interface: u32) -> Self {
        self.multicast_config.interface_v6 = Some(interface);
        self
    }
}

#[async_trait]
impl<A: ToSocketAddrs + Sync + Send> Transport for UdpTransport<A> {
    type Endpoint = SocketAddr;

    async fn bind(self) -> Result<BoxedFramedBinding<Self::Endpoint>, TransportError> {
        let socket = UdpSocket::bind(self.addresses).await?;
        let local_addr = socket.local_addr()?;
        if self.multicast {
            self.multicast_config.join(&socket, &local_addr)?;
        }
        debug!("Bound UDP transport to {local_addr}");
        Ok(Box::pin(UdpBinding {
            framed_socket: UdpFramed::new(socket, BytesCodec::new()),
            local_addr,
            mtu: self.mtu,
        }))
    }
}

impl MulticastConfig {
    fn join(&self, socket: &UdpSocket, local_addr: &SocketAddr) -> io::Result<()> {
        let groups = if self.groups.is_empty() {
            all_coap_nodes(local_addr)
        } else {
            self.groups.clone()
        };
        let bound_v4 = match local_addr {
            SocketAddr::V4(addr) => *addr.ip(),
            SocketAddr::V6(_) => Ipv4Addr::UNSPECIFIED,
        };

        for group in groups {
            debug!("Joining multicast group {group:?}");
            match group {
                MulticastGroup::V4 { group, interface } => {
                    let interface = interface.or(self.interface_v4).unwrap_or(bound_v4);
                    socket.join_multicast_v4(group, interface)?;
                }
                MulticastGroup::V6 { group, interface } => {
                    let interface = interface.or(self.interface_v6).unwrap_or(0);
                    socket.join_multicast_v6(&group, interface)?;
                }
            }
        }
        Ok(())
    }
}

fn all_coap_nodes(local_addr: &SocketAddr) -> Vec<MulticastGroup> {
    match local_addr {
        SocketAddr::V4(_) => vec![MulticastGroup::V4 {
            group: ALL_COAP_NODES_V4,
            interface: None,
        }],
        SocketAddr::V6(_) => [ALL_COAP_NODES_V6_LINK_LOCAL, ALL_COAP_NODES_V6_SITE_LOCAL]
            .into_iter()
            .map(|group| MulticastGroup::V6 {
                group,
                interface: None,
            })
            .collect(),
    }
}

#[pin_project]
struct UdpBinding {
    #[pin]
    framed_socket: UdpFramed<BytesCodec>,
    local_addr: SocketAddr,
    mtu: Option<u32>,
}

impl FramedBinding<SocketAddr> for UdpBinding {
    fn mtu(&self) -> Option<u32> {
        self.mtu
    }

    fn local_endpoint(&self) -> Option<SocketAddr> {
        Some(self.local_addr)
    }
}

impl Stream for UdpBinding {
    type Item = Result<FramedItem<SocketAddr>, FramedReadError<SocketAddr>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project()
            .framed_socket
            .poll_next(cx)
            .map(|item| item.map(|result| result.map_err(|e| (e.into(), None))))
    }
}

impl Sink<OutboundItem<SocketAddr>> for UdpBinding {
    type Error = TransportError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Sink::<(Bytes, SocketAddr)>::poll_ready(self.project().framed_socket, cx)
            .map_err(TransportError::from)
    }

    fn start_send(self: Pin<&mut Self>, item: (Bytes, SocketAddr)) -> Result<(), Self::Error> {
        Sink::<(Bytes, SocketAddr)>::start_send(self.project().framed_socket, item)
            .map_err(TransportError::from)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Sink::<(Bytes, SocketAddr)>::poll_flush(self.project().framed_socket, cx)
            .map_err(TransportError::from)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Sink::<(Bytes, SocketAddr)>::poll_close(self.project().framed_socket, cx)
            .map_err(TransportError::from)
    }
}
