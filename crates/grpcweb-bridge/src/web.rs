//! gRPC-Web wrapper around a gRPC handler

use grpcweb_core::{BoxBody, Handler, ResponseSink};
use http::header::ACCEPT;
use http::Request;
use std::io;
use tracing::debug;

use crate::classify::is_grpc_web_request;
use crate::request::transcode_request;
use crate::response::{EncodingMode, GrpcWebResponse};

/// Handler that lets gRPC-Web clients reach a gRPC handler.
///
/// gRPC-Web requests are transcoded on the way in and out; every other
/// request is passed to the wrapped handler untouched.
#[derive(Debug, Clone)]
pub struct GrpcWeb<H> {
    inner: H,
}

impl<H> GrpcWeb<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H: Handler> Handler for GrpcWeb<H> {
    async fn serve<S: ResponseSink>(
        &self,
        mut request: Request<BoxBody>,
        sink: &mut S,
    ) -> io::Result<()> {
        if !is_grpc_web_request(&request) {
            return self.inner.serve(request, sink).await;
        }

        let output = EncodingMode::from_header(request.headers().get(ACCEPT));
        let input = transcode_request(&mut request);
        debug!(
            path = %request.uri().path(),
            ?input,
            ?output,
            "transcoding grpc-web request"
        );

        let mut response = GrpcWebResponse::new(sink, output);
        let served = self.inner.serve(request, &mut response).await;
        let finished = response.finish().await;

        // A handler failure wins over a failure to write the trailer frame
        served.and(finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use grpcweb_core::MemorySink;
    use http::header::{CONTENT_TYPE, TE};
    use http::{HeaderValue, StatusCode, Version};
    use http_body_util::{BodyExt, Full};

    /// Records what the wrapped handler observed
    struct Probe;

    impl Handler for Probe {
        async fn serve<S: ResponseSink>(
            &self,
            request: Request<BoxBody>,
            sink: &mut S,
        ) -> io::Result<()> {
            let version = format!("{:?}", request.version());
            let headers = sink.headers_mut();
            headers.insert("x-version", HeaderValue::from_str(&version).unwrap());
            if let Some(te) = request.headers().get(TE) {
                headers.insert("x-te", te.clone());
            }
            let body = request.into_body().collect().await.map_err(io::Error::other)?;
            sink.write(body.to_bytes()).await
        }
    }

    fn request(content_type: &str, body: &'static [u8]) -> Request<BoxBody> {
        Request::builder()
            .version(Version::HTTP_11)
            .header(CONTENT_TYPE, content_type)
            .body(
                Full::new(Bytes::from_static(body))
                    .map_err(|never| match never {})
                    .boxed_unsync(),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_non_grpc_web_passthrough() {
        let mut sink = MemorySink::new();
        GrpcWeb::new(Probe)
            .serve(request("text/plain", b"plain"), &mut sink)
            .await
            .unwrap();

        // No transcoding and no trailer frame
        assert_eq!(sink.body(), b"plain");
        assert_eq!(sink.headers().get("x-version").unwrap(), "HTTP/1.1");
        assert!(sink.headers().get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn test_grpc_web_is_transcoded() {
        let mut sink = MemorySink::new();
        GrpcWeb::new(Probe)
            .serve(request("application/grpc-web", b"abc"), &mut sink)
            .await
            .unwrap();

        assert_eq!(sink.headers().get("x-version").unwrap(), "HTTP/2.0");
        assert_eq!(sink.headers().get("x-te").unwrap(), "trailers");
        assert_eq!(sink.status(), Some(StatusCode::OK));
        assert_eq!(sink.body(), b"abc\x80\x00\x00\x00\x00");
    }

    #[tokio::test]
    async fn test_handler_error_still_emits_trailer() {
        let mut sink = MemorySink::new();
        let err = GrpcWeb::new(Probe)
            .serve(request("application/grpc-web-text", b"AAAAAAA"), &mut sink)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "unexpected EOF");
        assert_eq!(sink.body(), b"\x80\x00\x00\x00\x00");
    }
}
