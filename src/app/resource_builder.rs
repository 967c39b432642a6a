use std::fmt;

use crate::app::request_handler::RequestHandler;
use crate::codec::Methods;

/// Configure a resource path, registering a handler per request method or group of methods.
pub struct ResourceBuilder {
    path: String,
    discoverable: bool,
    handlers: Vec<(Methods, Box<dyn RequestHandler>)>,
}

impl ResourceBuilder {
    /// `path` is matched byte for byte against the request's Uri-Path segments joined as
    /// `/a/b/c`.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            discoverable: true,
            handlers: Vec::new(),
        }
    }

    /// Leave this resource out of the `/.well-known/core` listing.
    pub fn not_discoverable(mut self) -> Self {
        self.discoverable = false;
        self
    }

    /// Set a request handler for "Get" requests.
    pub fn get(self, handler: impl RequestHandler) -> Self {
        self.method_handler(Methods::GET, handler)
    }

    /// Set a request handler for "Post" requests.
    pub fn post(self, handler: impl RequestHandler) -> Self {
        self.method_handler(Methods::POST, handler)
    }

    /// Set a request handler for "Put" requests.
    pub fn put(self, handler: impl RequestHandler) -> Self {
        self.method_handler(Methods::PUT, handler)
    }

    /// Set a request handler for "Delete" requests.
    pub fn delete(self, handler: impl RequestHandler) -> Self {
        self.method_handler(Methods::DELETE, handler)
    }

    /// Set a request handler for "Fetch" requests.
    pub fn fetch(self, handler: impl RequestHandler) -> Self {
        self.method_handler(Methods::FETCH, handler)
    }

    /// Set a request handler for "Patch" requests.
    pub fn patch(self, handler: impl RequestHandler) -> Self {
        self.method_handler(Methods::PATCH, handler)
    }

    /// Set a request handler for "iPatch" requests.
    pub fn ipatch(self, handler: impl RequestHandler) -> Self {
        self.method_handler(Methods::IPATCH, handler)
    }

    /// Set one handler for every method in `methods`, for example `Methods::GET | Methods::PUT`.
    /// Methods nobody registered are answered with 4.04 like an unknown path.
    pub fn method_handler(mut self, methods: Methods, handler: impl RequestHandler) -> Self {
        self.handlers.push((methods, Box::new(handler)));
        self
    }

    pub(crate) fn build(self) -> Vec<Resource> {
        let Self {
            path,
            discoverable,
            handlers,
        } = self;
        handlers
            .into_iter()
            .map(|(methods, handler)| Resource {
                path: path.clone(),
                methods,
                handler,
                discoverable,
            })
            .collect()
    }
}

/// One row of the routing table: path, accepted methods and the handler serving them.
#[derive(Clone)]
pub struct Resource {
    pub(crate) path: String,
    pub(crate) methods: Methods,
    pub(crate) handler: Box<dyn RequestHandler>,
    pub(crate) discoverable: bool,
}

impl Resource {
    pub fn new(path: &str, methods: Methods, handler: impl RequestHandler) -> Self {
        Self {
            path: path.to_string(),
            methods,
            handler: Box::new(handler),
            discoverable: true,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn methods(&self) -> Methods {
        self.methods
    }

    pub fn is_discoverable(&self) -> bool {
        self.discoverable
    }

    pub(crate) fn not_discoverable(mut self) -> Self {
        self.discoverable = false;
        self
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("path", &self.path)
            .field("methods", &self.methods)
            .field("discoverable", &self.discoverable)
            .finish_non_exhaustive()
    }
}
