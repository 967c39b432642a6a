use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

use log::{debug, warn};

use crate::app::app_builder::AppBuilder;
use crate::app::core_handler::CoreRequestHandler;
use crate::app::resource_builder::Resource;
use crate::codec::{build_reply, Code, Message, MessageType};
use crate::config::CodecConfig;
use crate::error::CoapError;
use crate::packet_handler::PacketHandler;

const DEFAULT_DISCOVERABLE: bool = true;

/// Routing table sorted by path, shared between clones.
#[derive(Clone)]
pub struct Router {
    resources: Arc<Vec<Resource>>,
    config: CodecConfig,
}

impl Router {
    pub fn new(mut resources: Vec<Resource>, config: CodecConfig) -> Self {
        // Stable, so handlers registered for the same path keep their registration order.
        resources.sort_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()));
        Self {
            resources: Arc::new(resources),
            config,
        }
    }

    pub(crate) fn from_builder(builder: AppBuilder, mtu: Option<u32>) -> Self {
        let config = builder.config.codec.unwrap_or_default().with_mtu(mtu);
        let mut resources = builder.resources;
        if builder.config.discoverable.unwrap_or(DEFAULT_DISCOVERABLE) {
            let core = CoreRequestHandler::new_resource(&resources, config.max_block_exponent());
            resources.push(core);
        }
        Self::new(resources, config)
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Generates the reply to `request` in `response`, returning its length.
    ///
    /// An empty (ping) message is answered with Reset.  Otherwise the first resource whose path
    /// equals the request URL and whose methods include the request method handles it; without
    /// one the reply is 4.04.
    pub fn dispatch(
        &self,
        request: &Message<'_>,
        response: &mut [u8],
    ) -> Result<usize, CoapError> {
        let code = request.code();
        if !code.is_request() {
            return Err(CoapError::NotARequest(code));
        }
        if code.is_empty() {
            return build_reply(request, Code::EMPTY, response, 0);
        }

        let method = request.method();
        let url = request.url();
        for resource in self.resources.iter() {
            if !resource.methods.intersects(method) {
                continue;
            }
            match url.cmp(resource.path.as_bytes()) {
                Ordering::Greater => continue,
                Ordering::Less => break,
                Ordering::Equal => {
                    debug!("{code} {} matched resource", resource.path);
                    return resource.handler.handle(request, response);
                }
            }
        }

        debug!("{code} {:?}: <no resource>!", request.url_str());
        build_reply(request, Code::NOT_FOUND, response, 0)
    }
}

impl<Endpoint: Debug> PacketHandler<Endpoint> for Router {
    fn handle(&self, packet: &[u8], peer: &Endpoint, response: &mut [u8]) -> Option<usize> {
        let request = match Message::parse(packet) {
            Ok(request) => request,
            Err(e) => {
                debug!("Dropping packet from {peer:?}: {e}");
                return None;
            }
        };

        if request.code().is_empty() && request.message_type() != MessageType::Confirmable {
            debug!(
                "Ignoring empty {:?} message from {peer:?}",
                request.message_type()
            );
            return None;
        }

        match self.dispatch(&request, response) {
            Ok(len) => Some(len),
            Err(CoapError::NotARequest(code)) => {
                warn!("Spurious response {code} from {peer:?}, ignoring...");
                None
            }
            Err(e) => {
                warn!("Handler for {:?} from {peer:?} failed: {e}", request.url_str());
                let code = if e.is_malformed_input() {
                    Code::BAD_REQUEST
                } else {
                    Code::INTERNAL_SERVER_ERROR
                };
                build_reply(&request, code, response, 0).ok()
            }
        }
    }

    fn response_buffer_size(&self) -> usize {
        self.config.response_buffer_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{RequestHandler, ResourceBuilder};
    use crate::codec::consts::{Methods, OPT_URI_PATH, WELL_KNOWN_CORE};
    use crate::codec::{build_header, put_option_uri, reply_simple};
    use crate::error::Malformed;

    fn text(body: &'static str) -> impl RequestHandler {
        move |request: &Message<'_>, response: &mut [u8]| {
            reply_simple(request, Code::CONTENT, response, 0, body.as_bytes())
        }
    }

    fn request(message_type: MessageType, code: Code, path: &str) -> Vec<u8> {
        let mut buf = vec![0u8; 128];
        let mut len = build_header(&mut buf, message_type, &[0x01, 0x02], code, 0x4242).unwrap();
        len += put_option_uri(&mut buf[len..], 0, path, OPT_URI_PATH).unwrap();
        buf.truncate(len);
        buf
    }

    fn router() -> Router {
        AppBuilder::new()
            .resource(ResourceBuilder::new("/b").get(text("b")))
            .resource(
                ResourceBuilder::new("/a")
                    .get(text("a-get"))
                    .put(text("a-put"))
                    .not_discoverable(),
            )
            .resource(ResourceBuilder::new("/a/b/c").get(text("abc")))
            .build()
    }

    fn dispatch(router: &Router, raw: &[u8]) -> Vec<u8> {
        let request = Message::parse(raw).unwrap();
        let mut response = [0u8; 256];
        let len = router.dispatch(&request, &mut response).unwrap();
        response[..len].to_vec()
    }

    #[test]
    fn test_table_sorted() {
        let router = router();
        let paths: Vec<_> = router.resources().iter().map(|r| r.path()).collect();
        assert_eq!(paths, vec!["/.well-known/core", "/a", "/a", "/a/b/c", "/b"]);
        assert_eq!(router.resources()[1].methods(), Methods::GET);
        assert_eq!(router.resources()[2].methods(), Methods::PUT);
    }

    #[test]
    fn test_exact_match_by_method() {
        let router = router();

        let raw = dispatch(&router, &request(MessageType::Confirmable, Code::PUT, "/a"));
        let reply = Message::parse(&raw).unwrap();
        assert_eq!(reply.code(), Code::CONTENT);
        assert_eq!(reply.payload(), b"a-put");

        let raw = dispatch(&router, &request(MessageType::Confirmable, Code::GET, "/a/b/c"));
        assert_eq!(Message::parse(&raw).unwrap().payload(), b"abc");

        let raw = dispatch(&router, &request(MessageType::Confirmable, Code::POST, "/a"));
        assert_eq!(Message::parse(&raw).unwrap().code(), Code::NOT_FOUND);
    }

    #[test]
    fn test_not_found() {
        let router = router();
        for path in ["/", "/0", "/a/b", "/c", "/b/c"] {
            let raw = dispatch(&router, &request(MessageType::Confirmable, Code::GET, path));
            let reply = Message::parse(&raw).unwrap();
            assert_eq!(reply.code(), Code::NOT_FOUND, "{path}");
            assert_eq!(reply.message_id(), 0x4242);
            assert_eq!(reply.token(), Some(&[0x01, 0x02][..]));
            assert!(reply.payload().is_empty());
        }
    }

    #[test]
    fn test_ping_answered_with_reset() {
        let router = router();
        let raw = dispatch(&router, &[0x40, 0x00, 0x12, 0x34]);
        assert_eq!(raw, vec![0x70, 0x00, 0x12, 0x34]);
    }

    #[test]
    fn test_response_rejected() {
        let router = router();
        let raw = request(MessageType::Acknowledgement, Code::CONTENT, "");
        let request = Message::parse(&raw).unwrap();
        let mut response = [0u8; 64];
        assert_eq!(
            router.dispatch(&request, &mut response),
            Err(CoapError::NotARequest(Code::CONTENT))
        );
        assert_eq!(
            PacketHandler::<()>::handle(&router, &raw, &(), &mut response),
            None
        );
    }

    #[test]
    fn test_discovery_listing() {
        let router = router();
        let raw = dispatch(
            &router,
            &request(MessageType::Confirmable, Code::GET, WELL_KNOWN_CORE),
        );
        assert_eq!(Message::parse(&raw).unwrap().payload(), b"</a/b/c>,</b>");

        let hidden = AppBuilder::new()
            .not_discoverable()
            .resource(ResourceBuilder::new("/b").get(text("b")))
            .build();
        let raw = dispatch(
            &hidden,
            &request(MessageType::Confirmable, Code::GET, WELL_KNOWN_CORE),
        );
        assert_eq!(Message::parse(&raw).unwrap().code(), Code::NOT_FOUND);
    }

    #[test]
    fn test_packet_handler_paths() {
        let router = router();
        let mut response = [0u8; 256];

        // malformed: unknown critical option 9
        let raw = [0x40, 0x01, 0x00, 0x01, 0x90];
        assert_eq!(
            PacketHandler::<()>::handle(&router, &raw, &(), &mut response),
            None
        );

        // NON ping is not answered
        assert_eq!(
            PacketHandler::<()>::handle(&router, &[0x50, 0x00, 0x00, 0x01], &(), &mut response),
            None
        );

        let raw = request(MessageType::NonConfirmable, Code::GET, "/b");
        let len = PacketHandler::<()>::handle(&router, &raw, &(), &mut response).unwrap();
        let reply = Message::parse(&response[..len]).unwrap();
        assert_eq!(reply.message_type(), MessageType::NonConfirmable);
        assert_eq!(reply.payload(), b"b");
    }

    #[test]
    fn test_handler_error_becomes_internal_server_error() {
        fn failing(_: &Message<'_>, _: &mut [u8]) -> Result<usize, CoapError> {
            Err(CoapError::buffer_too_small(4096, 256))
        }
        let router = AppBuilder::new()
            .resource(ResourceBuilder::new("/fail").get(failing))
            .build();
        let raw = request(MessageType::Confirmable, Code::GET, "/fail");
        let mut response = [0u8; 256];
        let len = PacketHandler::<()>::handle(&router, &raw, &(), &mut response).unwrap();
        assert_eq!(
            Message::parse(&response[..len]).unwrap().code(),
            Code::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_handler_rejecting_input_becomes_bad_request() {
        fn strict(request: &Message<'_>, _: &mut [u8]) -> Result<usize, CoapError> {
            match request.payload() {
                [] => Err(CoapError::InsufficientData),
                _ => Err(Malformed::EmptyPayload.into()),
            }
        }
        let router = AppBuilder::new()
            .resource(ResourceBuilder::new("/strict").post(strict))
            .build();
        let raw = request(MessageType::Confirmable, Code::POST, "/strict");
        let mut response = [0u8; 256];
        let len = PacketHandler::<()>::handle(&router, &raw, &(), &mut response).unwrap();
        let reply = Message::parse(&response[..len]).unwrap();
        assert_eq!(reply.code(), Code::BAD_REQUEST);
        assert_eq!(reply.message_id(), 0x4242);
    }
}
