//! Three-way dispatch between gRPC-Web, native gRPC and a fallback handler

use grpcweb_core::{BoxBody, Handler, ResponseSink};
use http::Request;
use std::io;
use std::sync::Arc;
use tracing::debug;

use crate::classify::{classify, RequestKind};
use crate::web::GrpcWeb;

/// Routes each request to exactly one handler.
///
/// gRPC-Web requests go through the [`GrpcWeb`] wrapper around the gRPC
/// handler, native gRPC requests go to the gRPC handler directly and
/// everything else goes to the fallback. gRPC-Web is checked first.
pub struct Dispatcher<G, F> {
    grpc: Arc<G>,
    grpc_web: GrpcWeb<Arc<G>>,
    fallback: F,
}

impl<G: Handler, F: Handler> Dispatcher<G, F> {
    pub fn new(grpc: G, fallback: F) -> Self {
        let grpc = Arc::new(grpc);
        Self {
            grpc_web: GrpcWeb::new(Arc::clone(&grpc)),
            grpc,
            fallback,
        }
    }
}

impl<G: Handler, F: Handler> Handler for Dispatcher<G, F> {
    async fn serve<S: ResponseSink>(
        &self,
        request: Request<BoxBody>,
        sink: &mut S,
    ) -> io::Result<()> {
        let kind = classify(request.headers(), request.version());
        debug!(?kind, path = %request.uri().path(), "dispatching request");

        match kind {
            RequestKind::GrpcWeb => self.grpc_web.serve(request, sink).await,
            RequestKind::Grpc => self.grpc.serve(request, sink).await,
            RequestKind::Other => self.fallback.serve(request, sink).await,
        }
    }
}
