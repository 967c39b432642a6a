use std::sync::Arc;

use crate::app::resource_builder::Resource;
use crate::app::RequestHandler;
use crate::block::reply_block2;
use crate::codec::consts::content_format::LINK_FORMAT;
use crate::codec::consts::{Code, Methods, WELL_KNOWN_CORE};
use crate::codec::Message;
use crate::error::CoapError;

/// Serves the CoRE link listing (`</a>,</b/c>`) of the app's discoverable resources, split into
/// Block2 blocks.
#[derive(Clone)]
pub struct CoreRequestHandler {
    paths: Arc<Vec<String>>,
    max_block_exponent: u8,
}

impl CoreRequestHandler {
    pub(crate) fn new_resource(resources: &[Resource], max_block_exponent: u8) -> Resource {
        let mut paths: Vec<String> = resources
            .iter()
            .filter(|r| r.discoverable)
            .map(|r| r.path.clone())
            .collect();
        paths.sort();
        paths.dedup();

        let me = Self {
            paths: Arc::new(paths),
            max_block_exponent,
        };
        Resource::new(WELL_KNOWN_CORE, Methods::GET, me).not_discoverable()
    }
}

impl RequestHandler for CoreRequestHandler {
    fn handle(&self, request: &Message<'_>, response: &mut [u8]) -> Result<usize, CoapError> {
        reply_block2(
            request,
            Code::CONTENT,
            response,
            LINK_FORMAT,
            self.max_block_exponent,
            |writer| {
                for (i, path) in self.paths.iter().enumerate() {
                    if i > 0 {
                        writer.put_char(b',');
                    }
                    writer.put_char(b'<');
                    writer.put_str(path);
                    writer.put_char(b'>');
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block2;
    use crate::codec::consts::{MessageType, OPT_BLOCK2, OPT_URI_PATH};
    use crate::codec::{build_header, put_option, put_option_uri};

    fn handler(paths: &[&str], max_block_exponent: u8) -> CoreRequestHandler {
        CoreRequestHandler {
            paths: Arc::new(paths.iter().map(|p| p.to_string()).collect()),
            max_block_exponent,
        }
    }

    fn request(block2: Option<u8>) -> Vec<u8> {
        let mut buf = vec![0u8; 64];
        let mut len = build_header(&mut buf, MessageType::Confirmable, &[0x33], Code::GET, 9)
            .unwrap();
        len += put_option_uri(&mut buf[len..], 0, WELL_KNOWN_CORE, OPT_URI_PATH).unwrap();
        if let Some(value) = block2 {
            len += put_option(&mut buf[len..], OPT_URI_PATH, OPT_BLOCK2, &[value]).unwrap();
        }
        buf.truncate(len);
        buf
    }

    #[test]
    fn test_single_block_listing() {
        let raw = request(None);
        let request = Message::parse(&raw).unwrap();
        let mut response = [0u8; 256];
        let len = handler(&["/a", "/b/c"], 7)
            .handle(&request, &mut response)
            .unwrap();

        let reply = Message::parse(&response[..len]).unwrap();
        assert_eq!(reply.code(), Code::CONTENT);
        assert_eq!(reply.message_type(), MessageType::Acknowledgement);
        assert_eq!(reply.token(), Some(&[0x33][..]));
        assert_eq!(reply.content_format(), Some(LINK_FORMAT));
        assert_eq!(reply.payload(), b"</a>,</b/c>");
        let block = reply.block2().unwrap();
        assert_eq!((block.number, block.more, block.exponent), (0, false, 7));
    }

    #[test]
    fn test_second_block() {
        let paths = ["/aaaaaaa", "/bbbbbbb", "/ccccccc", "/ddddddd"];
        let listing = "</aaaaaaa>,</bbbbbbb>,</ccccccc>,</ddddddd>";

        // num 1, szx 0: bytes 16..32
        let raw = request(Some(0x10));
        let request = Message::parse(&raw).unwrap();
        let mut response = [0u8; 128];
        let len = handler(&paths, 7).handle(&request, &mut response).unwrap();

        let reply = Message::parse(&response[..len]).unwrap();
        assert_eq!(reply.payload(), &listing.as_bytes()[16..32]);
        assert_eq!(
            reply.block2(),
            Some(Block2 {
                number: 1,
                more: true,
                exponent: 4
            })
        );
    }

    #[test]
    fn test_block_past_end_has_no_payload() {
        let raw = request(Some(0x50));
        let request = Message::parse(&raw).unwrap();
        let mut response = [0u8; 128];
        let len = handler(&["/a"], 7).handle(&request, &mut response).unwrap();

        let reply = Message::parse(&response[..len]).unwrap();
        assert!(!reply.has_payload_marker());
        assert!(reply.payload().is_empty());
        assert!(!reply.block2().unwrap().more);
    }

    #[test]
    fn test_response_buffer_too_small() {
        let raw = request(None);
        let request = Message::parse(&raw).unwrap();
        let mut response = [0u8; 64];
        assert!(matches!(
            handler(&["/a"], 7).handle(&request, &mut response),
            Err(CoapError::BufferTooSmall { .. })
        ));
    }
}
