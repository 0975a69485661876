//! gRPC to gRPC-Web response transcoding
//!
//! [`GrpcWebResponse`] wraps the host's sink and is what the wrapped gRPC
//! handler writes into. Encoder state:
//!
//! - `Idle`: nothing written since creation or since the last text flush
//! - `Binary`: bytes go straight to the sink
//! - `Text`: bytes go through a base64 encoder; a flush pads and closes the
//!   current run and returns to `Idle`
//!
//! [`GrpcWebResponse::finish`] appends the trailer frame and consumes the
//! wrapper, so nothing can be written after it.

use bytes::Bytes;
use grpcweb_core::content_type::{self, GRPC_WEB_PROTO, GRPC_WEB_TEXT_PROTO};
use grpcweb_core::{Base64Encoder, CloseNotify, ResponseSink};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use std::io;
use tracing::trace;

use crate::trailers::TrailerBlock;

/// Body encoding of one direction of a gRPC-Web exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingMode {
    Binary,
    Text,
}

impl EncodingMode {
    /// Text if the value is one of the `grpc-web-text` tokens, binary otherwise.
    pub fn from_header(value: Option<&HeaderValue>) -> Self {
        let text = value
            .and_then(|v| v.to_str().ok())
            .map(content_type::is_grpc_web_text)
            .unwrap_or(false);

        if text {
            Self::Text
        } else {
            Self::Binary
        }
    }

    /// Content type announced for responses in this mode
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Binary => GRPC_WEB_PROTO,
            Self::Text => GRPC_WEB_TEXT_PROTO,
        }
    }
}

enum State {
    Idle,
    Binary,
    Text(Base64Encoder),
}

/// Response sink presented to the wrapped gRPC handler
pub struct GrpcWebResponse<'a, S> {
    inner: &'a mut S,
    mode: EncodingMode,
    state: State,
}

impl<'a, S: ResponseSink> GrpcWebResponse<'a, S> {
    pub fn new(inner: &'a mut S, mode: EncodingMode) -> Self {
        Self {
            inner,
            mode,
            state: State::Idle,
        }
    }

    /// Output encoding chosen for this response
    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    fn apply_content_type(&mut self) {
        self.inner.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static(self.mode.content_type()),
        );
    }

    fn install_encoder(&mut self) {
        self.apply_content_type();
        self.state = match self.mode {
            EncodingMode::Binary => State::Binary,
            EncodingMode::Text => State::Text(Base64Encoder::new()),
        };
    }

    /// Close the current text run, writing out its padded remainder.
    async fn close_encoder(&mut self) -> io::Result<()> {
        if let State::Text(encoder) = &mut self.state {
            let tail = encoder.finish();
            self.state = State::Idle;
            if !tail.is_empty() {
                self.inner.write(tail).await?;
            }
        }
        Ok(())
    }

    /// Append the trailer frame built from the declared trailing metadata.
    ///
    /// Goes through the same write path as data, so it shares the current
    /// base64 run in text mode. The run is closed afterwards.
    pub async fn finish(mut self) -> io::Result<()> {
        let trailers = TrailerBlock::from_declared(self.inner.headers());
        trace!(fields = trailers.len(), mode = ?self.mode, "writing grpc-web trailer frame");

        self.write(trailers.to_frame()).await?;
        self.close_encoder().await
    }
}

impl<S: ResponseSink> ResponseSink for GrpcWebResponse<'_, S> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn set_status(&mut self, status: StatusCode) {
        self.apply_content_type();
        self.inner.set_status(status);
    }

    async fn write(&mut self, data: Bytes) -> io::Result<()> {
        if let State::Idle = self.state {
            self.install_encoder();
        }

        match &mut self.state {
            State::Text(encoder) => {
                let encoded = encoder.encode(&data);
                if encoded.is_empty() {
                    return Ok(());
                }
                self.inner.write(encoded).await
            }
            _ => self.inner.write(data).await,
        }
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.close_encoder().await?;
        self.inner.flush().await
    }

    fn close_notify(&self) -> CloseNotify {
        self.inner.close_notify()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grpcweb_core::MemorySink;
    use http::header::TRAILER;

    const STATUS_OK_FRAME: &[u8] = b"\x80\x00\x00\x00\x10Grpc-Status: 0\r\n";

    fn declare_ok(sink: &mut impl ResponseSink) {
        let headers = sink.headers_mut();
        headers.append(TRAILER, HeaderValue::from_static("Grpc-Status"));
        headers.insert("grpc-status", HeaderValue::from_static("0"));
    }

    #[test]
    fn test_mode_from_header() {
        let text = HeaderValue::from_static("application/grpc-web-text");
        let binary = HeaderValue::from_static("application/grpc-web");
        assert_eq!(EncodingMode::from_header(Some(&text)), EncodingMode::Text);
        assert_eq!(EncodingMode::from_header(Some(&binary)), EncodingMode::Binary);
        assert_eq!(EncodingMode::from_header(None), EncodingMode::Binary);
    }

    #[test]
    fn test_response_keeps_chosen_mode() {
        let mut sink = MemorySink::new();
        let response = GrpcWebResponse::new(&mut sink, EncodingMode::Text);
        assert_eq!(response.mode(), EncodingMode::Text);
        assert_eq!(response.mode().content_type(), "application/grpc-web-text+proto");
    }

    #[tokio::test]
    async fn test_binary_passthrough_and_trailer() {
        let mut sink = MemorySink::new();
        let mut response = GrpcWebResponse::new(&mut sink, EncodingMode::Binary);
        response.write(Bytes::from_static(&[0, 0, 0, 0, 0])).await.unwrap();
        declare_ok(&mut response);
        response.finish().await.unwrap();

        let mut expected = vec![0, 0, 0, 0, 0];
        expected.extend_from_slice(STATUS_OK_FRAME);
        assert_eq!(sink.body(), &expected[..]);
        assert_eq!(
            sink.committed_headers().unwrap().get(CONTENT_TYPE).unwrap(),
            "application/grpc-web+proto"
        );
    }

    #[tokio::test]
    async fn test_trailer_only_response_sets_content_type() {
        let mut sink = MemorySink::new();
        let mut response = GrpcWebResponse::new(&mut sink, EncodingMode::Binary);
        declare_ok(&mut response);
        response.finish().await.unwrap();

        assert_eq!(sink.body(), STATUS_OK_FRAME);
        assert_eq!(sink.status(), Some(StatusCode::OK));
        assert!(sink.committed_headers().unwrap().contains_key(CONTENT_TYPE));
    }

    #[tokio::test]
    async fn test_text_flush_starts_new_run() {
        let mut sink = MemorySink::new();
        let mut response = GrpcWebResponse::new(&mut sink, EncodingMode::Text);
        response.write(Bytes::from_static(&[0, 0, 0, 0, 0])).await.unwrap();
        response.flush().await.unwrap();
        declare_ok(&mut response);
        response.finish().await.unwrap();

        assert_eq!(sink.body(), b"AAAAAAA=gAAAABBHcnBjLVN0YXR1czogMA0K");
        assert_eq!(sink.flushes(), 1);
        assert_eq!(
            sink.committed_headers().unwrap().get(CONTENT_TYPE).unwrap(),
            "application/grpc-web-text+proto"
        );
    }

    #[tokio::test]
    async fn test_text_without_flush_is_one_run() {
        let mut sink = MemorySink::new();
        let mut response = GrpcWebResponse::new(&mut sink, EncodingMode::Text);
        response.write(Bytes::from_static(&[0, 0, 0, 0, 0])).await.unwrap();
        declare_ok(&mut response);
        response.finish().await.unwrap();

        let mut raw = vec![0, 0, 0, 0, 0];
        raw.extend_from_slice(STATUS_OK_FRAME);
        use base64::Engine;
        let expected = base64::engine::general_purpose::STANDARD.encode(&raw);
        assert_eq!(sink.body(), expected.as_bytes());
    }

    #[tokio::test]
    async fn test_finish_pads_trailing_remainder() {
        let mut sink = MemorySink::new();
        let response = GrpcWebResponse::new(&mut sink, EncodingMode::Text);
        // Empty trailer frame is 5 bytes, not a multiple of 3
        response.finish().await.unwrap();
        assert_eq!(sink.body(), b"gAAAAAA=");
    }

    #[tokio::test]
    async fn test_repeated_status_keeps_content_type() {
        let mut sink = MemorySink::new();
        let mut response = GrpcWebResponse::new(&mut sink, EncodingMode::Binary);
        response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/grpc"));
        response.set_status(StatusCode::OK);
        response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/grpc"));
        response.set_status(StatusCode::OK);
        response.write(Bytes::from_static(b"x")).await.unwrap();

        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/grpc-web+proto"
        );
        assert_eq!(
            sink.committed_headers().unwrap().get(CONTENT_TYPE).unwrap(),
            "application/grpc-web+proto"
        );
    }

    #[tokio::test]
    async fn test_write_error_propagates() {
        let mut sink = MemorySink::new();
        sink.fail_writes(io::ErrorKind::BrokenPipe);
        let response = GrpcWebResponse::new(&mut sink, EncodingMode::Binary);
        let err = response.finish().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
