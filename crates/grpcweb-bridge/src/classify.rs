//! Content-type based request classification

use grpcweb_core::content_type;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Request, Version};

/// Which handler a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    GrpcWeb,
    Grpc,
    Other,
}

/// Classify a request from its headers and protocol version.
///
/// Native gRPC requires HTTP/2; an `application/grpc` request over any other
/// version is classified as [`RequestKind::Other`].
pub fn classify(headers: &HeaderMap, version: Version) -> RequestKind {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type::is_grpc_web(content_type) {
        RequestKind::GrpcWeb
    } else if version == Version::HTTP_2 && content_type::is_grpc(content_type) {
        RequestKind::Grpc
    } else {
        RequestKind::Other
    }
}

/// Returns true if the request is for a gRPC-Web handler.
pub fn is_grpc_web_request<B>(req: &Request<B>) -> bool {
    classify(req.headers(), req.version()) == RequestKind::GrpcWeb
}

/// Returns true if the request is for a native gRPC handler.
pub fn is_grpc_request<B>(req: &Request<B>) -> bool {
    classify(req.headers(), req.version()) == RequestKind::Grpc
}
