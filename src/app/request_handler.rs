use dyn_clone::DynClone;

use crate::codec::Message;
use crate::error::CoapError;

/// Generates the complete reply to a request routed to a resource.
///
/// `response` is the reply buffer; the handler writes header, options and payload into it
/// (usually through [`crate::codec::reply_simple`] or [`crate::codec::build_reply`]) and returns
/// the number of bytes written.  Plain functions and closures with the same signature implement
/// this trait.
pub trait RequestHandler: DynClone + Send + Sync + 'static {
    fn handle(&self, request: &Message<'_>, response: &mut [u8]) -> Result<usize, CoapError>;
}

dyn_clone::clone_trait_object!(RequestHandler);

impl<F> RequestHandler for F
where
    F: Fn(&Message<'_>, &mut [u8]) -> Result<usize, CoapError> + Clone + Send + Sync + 'static,
{
    fn handle(&self, request: &Message<'_>, response: &mut [u8]) -> Result<usize, CoapError> {
        (self)(request, response)
    }
}
