//! gRPC-Web to gRPC request transcoding

use grpcweb_core::content_type::{ACCEPTED_ENCODINGS, GRPC, GRPC_ACCEPT_ENCODING};
use grpcweb_core::BoxBody;
use http::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE, TE};
use http::{HeaderValue, Request, Version};
use http_body_util::BodyExt;

use crate::body::Base64DecodeBody;
use crate::response::EncodingMode;

/// Rewrite a gRPC-Web request in place into a canonical gRPC request.
///
/// Returns the encoding the request body arrived in. Text bodies are
/// replaced by a lazily decoding wrapper, so malformed base64 is reported by
/// the body when it is read, never here.
pub fn transcode_request(req: &mut Request<BoxBody>) -> EncodingMode {
    *req.version_mut() = Version::HTTP_2;

    let headers = req.headers_mut();
    headers.remove(CONTENT_LENGTH);

    let input = EncodingMode::from_header(headers.get(CONTENT_TYPE));

    headers.insert(CONTENT_TYPE, HeaderValue::from_static(GRPC));
    headers.insert(TE, HeaderValue::from_static("trailers"));
    headers.insert(
        HeaderName::from_static(GRPC_ACCEPT_ENCODING),
        HeaderValue::from_static(ACCEPTED_ENCODINGS),
    );

    if input == EncodingMode::Text {
        let body = std::mem::take(req.body_mut());
        *req.body_mut() = Base64DecodeBody::new(body).boxed_unsync();
    }

    input
}
