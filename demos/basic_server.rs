use nanocoap::block::reply_block2;
use nanocoap::codec::consts::content_format::TEXT_PLAIN;
use nanocoap::codec::{reply_simple, Code, Message};
use nanocoap::config::CodecConfig;
use nanocoap::{app, CoapError, CoapServer, FatalServerError, UdpTransport};

#[tokio::main]
async fn main() -> Result<(), FatalServerError> {
    env_logger::init();
    let server = CoapServer::bind(UdpTransport::new("0.0.0.0:5683")).await?;
    server
        .serve(
            app::new()
                // Serve /.well-known/core in 64 byte blocks.
                .config(CodecConfig::new(64, 1152).map_err(|e| {
                    FatalServerError::InternalError(format!("bad codec config: {e}"))
                })?)
                .resource(
                    // Try `coap-client -m get coap://localhost/.well-known/core` to see this!
                    app::resource("/hello").get(handle_get_hello),
                )
                .resource(app::resource("/riot/board").get(handle_get_board))
                .resource(app::resource("/lorem").get(handle_get_lorem))
                .resource(
                    app::resource("/hidden")
                        .not_discoverable()
                        .get(handle_get_hidden),
                ),
        )
        .await
}

fn handle_get_hello(request: &Message<'_>, response: &mut [u8]) -> Result<usize, CoapError> {
    let whom = request
        .queries()
        .find_map(|query| query.strip_prefix(b"name="))
        .unwrap_or(b"world");

    let mut payload = b"Hello, ".to_vec();
    payload.extend_from_slice(whom);
    reply_simple(request, Code::CONTENT, response, TEXT_PLAIN, &payload)
}

fn handle_get_board(request: &Message<'_>, response: &mut [u8]) -> Result<usize, CoapError> {
    reply_simple(request, Code::CONTENT, response, TEXT_PLAIN, std::env::consts::ARCH.as_bytes())
}

/// About 700 bytes, delivered in blocks of at most 128 bytes.
fn handle_get_lorem(request: &Message<'_>, response: &mut [u8]) -> Result<usize, CoapError> {
    reply_block2(request, Code::CONTENT, response, TEXT_PLAIN, 7, |writer| {
        for line in 0..20 {
            writer.put_str("Lorem ipsum dolor sit amet, line ");
            writer.put_str(&line.to_string());
            writer.put_char(b'\n');
        }
    })
}

fn handle_get_hidden(request: &Message<'_>, response: &mut [u8]) -> Result<usize, CoapError> {
    reply_simple(request, Code::CONTENT, response, TEXT_PLAIN, b"sshh!")
}
