//! `grpc.testing.TestService` subset served as a canonical gRPC handler

use bytes::Bytes;
use grpcweb_core::content_type::{self, GRPC};
use grpcweb_core::{BoxBody, FrameParser, Handler, ResponseSink};
use http::header::{CONTENT_TYPE, TRAILER};
use http::{HeaderValue, Request, StatusCode};
use http_body_util::BodyExt;
use prost::Message;
use std::io;
use std::time::Duration;
use tracing::debug;

use crate::messages::{
    Empty, Payload, SimpleRequest, SimpleResponse, StreamingOutputCallRequest,
    StreamingOutputCallResponse,
};
use crate::status::Status;

pub const EMPTY_CALL: &str = "/grpc.testing.TestService/EmptyCall";
pub const UNARY_CALL: &str = "/grpc.testing.TestService/UnaryCall";
pub const STREAMING_OUTPUT_CALL: &str = "/grpc.testing.TestService/StreamingOutputCall";

#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error(transparent)]
    Status(#[from] Status),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Interop test service
///
/// Behaves like a conformant gRPC server: it requires an `application/grpc`
/// content type, declares `Grpc-Status` and `Grpc-Message` as trailers, flushes
/// after every response message and records the final status in the declared
/// headers once the call is done.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestService;

impl Handler for TestService {
    async fn serve<S: ResponseSink>(
        &self,
        request: Request<BoxBody>,
        sink: &mut S,
    ) -> io::Result<()> {
        let is_grpc = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(content_type::is_grpc)
            .unwrap_or(false);
        if !is_grpc {
            sink.set_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
            return Ok(());
        }

        let headers = sink.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(GRPC));
        headers.append(TRAILER, HeaderValue::from_static("Grpc-Status"));
        headers.append(TRAILER, HeaderValue::from_static("Grpc-Message"));

        let method = request.uri().path().to_owned();
        let status = match call(&method, request.into_body(), sink).await {
            Ok(()) => Status::ok(),
            Err(CallError::Status(status)) => status,
            Err(CallError::Io(err)) => return Err(err),
        };

        debug!(%method, code = %status.code, "call finished");
        status.write_to(sink.headers_mut());
        Ok(())
    }
}

async fn call<S: ResponseSink>(method: &str, body: BoxBody, sink: &mut S) -> Result<(), CallError> {
    match method {
        EMPTY_CALL => {
            let _: Empty = read_unary(body).await?;
            send(sink, &Empty {}).await?;
        }
        UNARY_CALL => {
            let request: SimpleRequest = read_unary(body).await?;
            let response = SimpleResponse {
                payload: Some(payload(request.response_type, request.response_size)?),
                username: String::new(),
            };
            send(sink, &response).await?;
        }
        STREAMING_OUTPUT_CALL => {
            let request: StreamingOutputCallRequest = read_unary(body).await?;
            for params in &request.response_parameters {
                if params.interval_us > 0 {
                    tokio::time::sleep(Duration::from_micros(params.interval_us as u64)).await;
                }
                let response = StreamingOutputCallResponse {
                    payload: Some(payload(request.response_type, params.size)?),
                };
                send(sink, &response).await?;
            }
        }
        _ => return Err(Status::unimplemented(format!("unknown method {}", method)).into()),
    }
    Ok(())
}

/// Read exactly one request message from the body.
async fn read_unary<M: Message + Default>(mut body: BoxBody) -> Result<M, Status> {
    let mut parser = FrameParser::new();
    let mut message = None;

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| Status::internal(e.to_string()))?;
        let Ok(data) = frame.into_data() else {
            continue;
        };
        parser.feed(&data);

        while let Some(frame) = parser
            .parse_frame()
            .map_err(|e| Status::resource_exhausted(e.to_string()))?
        {
            if frame.flags.is_compressed() {
                return Err(Status::unimplemented("compressed requests are not supported"));
            }
            if message.is_some() {
                return Err(Status::unimplemented("unary call received more than one message"));
            }
            message = Some(M::decode(frame.payload).map_err(|e| Status::internal(e.to_string()))?);
        }
    }

    if parser.remaining() > 0 {
        return Err(Status::internal("truncated message frame"));
    }
    message.ok_or_else(|| Status::unimplemented("unary call received no message"))
}

async fn send<S: ResponseSink, M: Message>(sink: &mut S, message: &M) -> io::Result<()> {
    let frame = grpcweb_core::Frame::message(Bytes::from(message.encode_to_vec()));
    sink.write(frame.encode()).await?;
    sink.flush().await
}

fn payload(r#type: i32, size: i32) -> Result<Payload, Status> {
    let size = usize::try_from(size)
        .map_err(|_| Status::invalid_argument(format!("negative payload size {}", size)))?;
    Ok(Payload {
        r#type,
        body: vec![0; size],
    })
}
