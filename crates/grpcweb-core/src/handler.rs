//! Request handler trait

use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use std::future::Future;
use std::io;
use std::sync::Arc;

use crate::sink::ResponseSink;

/// Boxed error carried by request bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request body type seen by every handler
pub type BoxBody = UnsyncBoxBody<Bytes, BoxError>;

/// Trait for anything that serves a request by writing into a [`ResponseSink`].
///
/// The gRPC-Web wrapper, the dispatcher, the wrapped gRPC handler and the
/// fallback handler all implement this trait, so they compose freely.
pub trait Handler: Send + Sync + 'static {
    /// Serve one request.
    ///
    /// Errors are I/O failures of the underlying sink; protocol-level
    /// failures are expected to be reported through the response itself.
    fn serve<S: ResponseSink>(
        &self,
        request: Request<BoxBody>,
        sink: &mut S,
    ) -> impl Future<Output = io::Result<()>> + Send;
}

impl<H: Handler> Handler for Arc<H> {
    fn serve<S: ResponseSink>(
        &self,
        request: Request<BoxBody>,
        sink: &mut S,
    ) -> impl Future<Output = io::Result<()>> + Send {
        (**self).serve(request, sink)
    }
}

/// Fallback handler answering every request with `404 Not Found`
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

impl Handler for NotFound {
    async fn serve<S: ResponseSink>(
        &self,
        _request: Request<BoxBody>,
        sink: &mut S,
    ) -> io::Result<()> {
        sink.set_status(StatusCode::NOT_FOUND);
        Ok(())
    }
}
