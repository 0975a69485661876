//! gRPC-Web server implementation

use grpcweb_bridge::Dispatcher;
use grpcweb_core::{BoxError, Handler, NotFound};
use http::{Request, Response, StatusCode, Version};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::body::ResponseBody;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::sink::ChannelSink;

/// Server hosting a handler over HTTP/1.1 and HTTP/2
pub struct GrpcWebServer<H> {
    handler: Arc<H>,
    config: ServerConfig,
}

impl<H: Handler> GrpcWebServer<H> {
    /// Create a new server around any handler
    pub fn new(handler: H, config: ServerConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            config,
        }
    }

    /// Serve the server on the given address
    pub async fn serve(self, addr: SocketAddr) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve_listener(listener).await
    }

    /// Serve connections accepted from an already bound listener
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        if let Ok(addr) = listener.local_addr() {
            info!("gRPC-Web server listening on {}", addr);
        }

        loop {
            let (stream, remote_addr) = listener.accept().await.map_err(ServerError::Accept)?;
            let handler = Arc::clone(&self.handler);
            let config = self.config.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let service_config = config.clone();
                let service = hyper::service::service_fn(move |req: Request<Incoming>| {
                    let handler = Arc::clone(&handler);
                    let config = service_config.clone();
                    async move { Ok::<_, Infallible>(handle(handler, config, req).await) }
                });

                let mut builder = auto::Builder::new(TokioExecutor::new());
                builder.http1().keep_alive(config.http1_keep_alive);
                builder
                    .http2()
                    .max_concurrent_streams(config.http2_max_concurrent_streams);

                if let Err(err) = builder.serve_connection(io, service).await {
                    error!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }
}

/// Run one request on its own task and return its response once committed.
async fn handle<H: Handler>(
    handler: Arc<H>,
    config: ServerConfig,
    req: Request<Incoming>,
) -> Response<ResponseBody> {
    let native_trailers = config.http2_trailers && req.version() == Version::HTTP_2;
    let req = req.map(|body| body.map_err(|e| Box::new(e) as BoxError).boxed_unsync());
    let (mut sink, head) = ChannelSink::new(config.body_buffer, native_trailers);

    tokio::spawn(async move {
        if let Err(err) = handler.serve(req, &mut sink).await {
            warn!("Handler failed: {}", err);
        }
        if let Err(err) = sink.finish().await {
            debug!("Failed to finish response: {}", err);
        }
    });

    match head.await {
        Ok(response) => response,
        Err(_) => {
            // The handler task panicked before committing anything
            let mut response = Response::new(ResponseBody::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

/// Builder wiring a gRPC handler and a fallback into a [`Dispatcher`]
pub struct ServerBuilder<G, F> {
    grpc: G,
    fallback: F,
    config: ServerConfig,
}

impl<G: Handler> ServerBuilder<G, NotFound> {
    /// Start from the gRPC handler; unmatched requests get `404 Not Found`
    pub fn new(grpc: G) -> Self {
        Self {
            grpc,
            fallback: NotFound,
            config: ServerConfig::default(),
        }
    }
}

impl<G: Handler, F: Handler> ServerBuilder<G, F> {
    /// Handler for requests that are neither gRPC nor gRPC-Web
    pub fn fallback<F2: Handler>(self, fallback: F2) -> ServerBuilder<G, F2> {
        ServerBuilder {
            grpc: self.grpc,
            fallback,
            config: self.config,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the server
    pub fn build(self) -> GrpcWebServer<Dispatcher<G, F>> {
        GrpcWebServer::new(Dispatcher::new(self.grpc, self.fallback), self.config)
    }
}

impl<G: Handler> GrpcWebServer<Dispatcher<G, NotFound>> {
    /// Create a builder for a dispatching server around a gRPC handler
    pub fn builder(grpc: G) -> ServerBuilder<G, NotFound> {
        ServerBuilder::new(grpc)
    }
}
