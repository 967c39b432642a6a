use std::fmt::Debug;

use crate::app::resource_builder::Resource;
use crate::app::router::Router;
use crate::app::ResourceBuilder;
use crate::config::CodecConfig;
use crate::packet_handler::IntoHandler;

/// Main builder API to configure how the CoAP server should respond to requests
#[derive(Default)]
pub struct AppBuilder {
    pub(crate) config: ConfigBuilder,
    pub(crate) resources: Vec<Resource>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ConfigBuilder {
    pub discoverable: Option<bool>,
    pub codec: Option<CodecConfig>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Serve `/.well-known/core` listing every discoverable resource.  This is the default; to
    /// hide a single resource, see [`ResourceBuilder::not_discoverable`].
    ///
    /// For more information refer to [RFC 6690](https://datatracker.ietf.org/doc/html/rfc6690).
    pub fn discoverable(mut self) -> Self {
        self.config.discoverable = Some(true);
        self
    }

    /// Do not serve `/.well-known/core` at all.
    ///
    /// See [`AppBuilder::discoverable`].
    pub fn not_discoverable(mut self) -> Self {
        self.config.discoverable = Some(false);
        self
    }

    /// Override block and reply buffer sizing.  The transport's MTU, when known, can still shrink
    /// the configured block size.
    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config.codec = Some(config);
        self
    }

    /// Add a resource handler to the app by the configured path.
    pub fn resource(mut self, resource: ResourceBuilder) -> Self {
        self.resources.extend(resource.build());
        self
    }

    /// Convenience method to add multiple resources at once.
    pub fn resources(mut self, resources: Vec<ResourceBuilder>) -> Self {
        for resource in resources {
            self = self.resource(resource);
        }
        self
    }

    /// Build the routing table without binding a transport.
    pub fn build(self) -> Router {
        Router::from_builder(self, None)
    }
}

impl<Endpoint: Debug> IntoHandler<Router, Endpoint> for AppBuilder {
    fn into_handler(self, mtu: Option<u32>) -> Router {
        Router::from_builder(self, mtu)
    }
}
