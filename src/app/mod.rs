//! Resource routing on top of the codec: build a table of path/method handlers with
//! [`AppBuilder`], then hand it to [`crate::CoapServer::serve`] or call [`Router::dispatch`]
//! directly.

pub use app_builder::AppBuilder;
pub use core_handler::CoreRequestHandler;
pub use request_handler::RequestHandler;
pub use resource_builder::{Resource, ResourceBuilder};
pub use router::Router;

mod app_builder;
mod core_handler;
mod request_handler;
mod resource_builder;
mod router;

pub fn new() -> AppBuilder {
    AppBuilder::new()
}

pub fn resource(path: &str) -> ResourceBuilder {
    ResourceBuilder::new(path)
}
