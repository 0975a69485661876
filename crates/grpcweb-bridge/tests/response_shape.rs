//! Every gRPC-Web response ends with exactly one trailer frame

use bytes::Bytes;
use grpcweb_bridge::GrpcWeb;
use grpcweb_core::{
    Base64Decoder, BoxBody, Frame, FrameParser, Handler, MemorySink, ResponseSink,
};
use http::header::{ACCEPT, CONTENT_TYPE, TRAILER};
use http::{HeaderValue, Request, Version};
use http_body_util::{BodyExt, Empty};
use std::io;

/// gRPC handler emitting `count` messages, flushing after every `flush_every`
struct Emitter {
    count: usize,
    flush_every: usize,
}

impl Handler for Emitter {
    async fn serve<S: ResponseSink>(
        &self,
        _request: Request<BoxBody>,
        sink: &mut S,
    ) -> io::Result<()> {
        let headers = sink.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/grpc"));
        headers.append(TRAILER, HeaderValue::from_static("Grpc-Status, Grpc-Message"));

        for i in 0..self.count {
            let payload = Bytes::from(vec![i as u8; i + 1]);
            sink.write(Frame::message(payload).encode()).await?;
            if (i + 1) % self.flush_every == 0 {
                sink.flush().await?;
            }
        }

        sink.headers_mut()
            .insert("grpc-status", HeaderValue::from_static("0"));
        Ok(())
    }
}

fn request(accept: &'static str) -> Request<BoxBody> {
    Request::builder()
        .method("POST")
        .version(Version::HTTP_11)
        .uri("/test.Service/Method")
        .header(CONTENT_TYPE, "application/grpc-web")
        .header(ACCEPT, accept)
        .body(Empty::new().map_err(|never| match never {}).boxed_unsync())
        .unwrap()
}

fn frames(raw: &[u8]) -> Vec<Frame> {
    let mut parser = FrameParser::new();
    parser.feed(raw);
    let mut frames = Vec::new();
    while let Some(frame) = parser.parse_frame().unwrap() {
        frames.push(frame);
    }
    assert_eq!(parser.remaining(), 0, "trailing partial frame");
    frames
}

#[tokio::test]
async fn test_binary_responses_end_with_one_trailer_frame() {
    for count in 0..6 {
        for flush_every in 1..4 {
            let bridge = GrpcWeb::new(Emitter { count, flush_every });
            let mut sink = MemorySink::new();
            bridge
                .serve(request("application/grpc-web"), &mut sink)
                .await
                .unwrap();

            let frames = frames(sink.body());
            assert_eq!(frames.len(), count + 1);

            let (last, data) = frames.split_last().unwrap();
            assert!(last.flags.is_trailers());
            assert_eq!(&last.payload[..], b"Grpc-Status: 0\r\n");
            for (i, frame) in data.iter().enumerate() {
                assert!(!frame.flags.is_trailers());
                assert_eq!(frame.payload.len(), i + 1);
            }
        }
    }
}

#[tokio::test]
async fn test_text_responses_end_with_one_trailer_frame() {
    for count in 0..6 {
        for flush_every in 1..4 {
            let bridge = GrpcWeb::new(Emitter { count, flush_every });
            let mut sink = MemorySink::new();
            bridge
                .serve(request("application/grpc-web-text"), &mut sink)
                .await
                .unwrap();

            assert_eq!(
                sink.committed_headers().unwrap().get(CONTENT_TYPE).unwrap(),
                "application/grpc-web-text+proto"
            );

            // Output is a sequence of complete, padded base64 runs
            assert_eq!(sink.body().len() % 4, 0);
            assert!(sink.body().iter().all(|b| b.is_ascii_alphanumeric()
                || matches!(b, b'+' | b'/' | b'=')));

            let mut decoder = Base64Decoder::new();
            let raw = decoder.decode(sink.body()).unwrap();
            decoder.finish().unwrap();

            let frames = frames(&raw);
            assert_eq!(frames.len(), count + 1);
            let (last, data) = frames.split_last().unwrap();
            assert!(last.flags.is_trailers());
            assert_eq!(&last.payload[..], b"Grpc-Status: 0\r\n");
            assert!(data.iter().all(|f| !f.flags.is_trailers()));
        }
    }
}
