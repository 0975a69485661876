//! [`ResponseSink`] implementation over a hyper response

use bytes::Bytes;
use grpcweb_bridge::TrailerBlock;
use grpcweb_core::{close_pair, CloseNotify, ResponseSink};
use http::{HeaderMap, Response, StatusCode};
use http_body::Frame;
use std::io;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::body::ResponseBody;

/// Sink feeding a [`ResponseBody`] through a bounded channel.
///
/// The response head is handed to hyper on the first status, write or flush;
/// header changes made afterwards stay local and are where handlers record
/// trailing metadata. Writes wait while the channel is full.
pub struct ChannelSink {
    status: StatusCode,
    headers: HeaderMap,
    head: Option<(oneshot::Sender<Response<ResponseBody>>, ResponseBody)>,
    tx: mpsc::Sender<Frame<Bytes>>,
    notify: CloseNotify,
    native_trailers: bool,
}

impl ChannelSink {
    /// Create a sink and the receiver that yields its response once committed.
    ///
    /// With `native_trailers`, [`finish`](Self::finish) also sends the declared
    /// trailing metadata as real HTTP trailers.
    pub fn new(
        buffer: usize,
        native_trailers: bool,
    ) -> (Self, oneshot::Receiver<Response<ResponseBody>>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let (guard, notify) = close_pair();
        let (head_tx, head_rx) = oneshot::channel();

        let sink = Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            head: Some((head_tx, ResponseBody::new(rx, guard))),
            tx,
            notify,
            native_trailers,
        };
        (sink, head_rx)
    }

    /// Returns true once the response head has been handed to hyper
    pub fn is_committed(&self) -> bool {
        self.head.is_none()
    }

    fn commit(&mut self) {
        if let Some((head_tx, body)) = self.head.take() {
            let mut response = Response::new(body);
            *response.status_mut() = self.status;
            *response.headers_mut() = self.headers.clone();
            trace!(status = %self.status, "committing response head");

            if head_tx.send(response).is_err() {
                debug!("response receiver dropped before commit");
            }
        }
    }

    /// Complete the response.
    ///
    /// Commits the head if the handler never did and, for native trailers,
    /// sends the declared trailing metadata. Dropping the sink ends the body.
    pub async fn finish(mut self) -> io::Result<()> {
        self.commit();

        if self.native_trailers {
            let trailers = TrailerBlock::from_declared(&self.headers);
            if !trailers.is_empty() {
                self.send(Frame::trailers(trailers.into_header_map())).await?;
            }
        }
        Ok(())
    }

    async fn send(&mut self, frame: Frame<Bytes>) -> io::Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client disconnected"))
    }
}

impl ResponseSink for ChannelSink {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_status(&mut self, status: StatusCode) {
        if self.is_committed() {
            debug!(%status, "status set after response head was committed");
            return;
        }
        self.status = status;
        self.commit();
    }

    async fn write(&mut self, data: Bytes) -> io::Result<()> {
        self.commit();
        if data.is_empty() {
            return Ok(());
        }
        self.send(Frame::data(data)).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        // Chunks are handed to hyper as soon as they are written
        self.commit();
        Ok(())
    }

    fn close_notify(&self) -> CloseNotify {
        self.notify.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::TRAILER;
    use http::HeaderValue;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_head_committed_on_first_write() {
        let (mut sink, head) = ChannelSink::new(4, false);
        sink.headers_mut()
            .insert("x-test", HeaderValue::from_static("1"));
        sink.write(Bytes::from("hello")).await.unwrap();
        sink.headers_mut()
            .insert("x-late", HeaderValue::from_static("1"));
        sink.finish().await.unwrap();

        let response = head.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-test"));
        assert!(!response.headers().contains_key("x-late"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn test_first_status_wins() {
        let (mut sink, head) = ChannelSink::new(4, false);
        sink.set_status(StatusCode::NOT_FOUND);
        sink.set_status(StatusCode::OK);
        drop(sink);

        assert_eq!(head.await.unwrap().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_native_trailers() {
        let (mut sink, head) = ChannelSink::new(4, true);
        sink.headers_mut()
            .append(TRAILER, HeaderValue::from_static("Grpc-Status"));
        sink.write(Bytes::from("x")).await.unwrap();
        sink.headers_mut()
            .insert("grpc-status", HeaderValue::from_static("0"));

        let finish = tokio::spawn(sink.finish());
        let collected = head.await.unwrap().into_body().collect().await.unwrap();
        finish.await.unwrap().unwrap();

        assert_eq!(collected.trailers().unwrap().get("grpc-status").unwrap(), "0");
        assert_eq!(&collected.to_bytes()[..], b"x");
    }

    #[tokio::test]
    async fn test_write_after_disconnect_is_broken_pipe() {
        let (mut sink, head) = ChannelSink::new(1, false);
        sink.commit();
        drop(head.await.unwrap());

        let mut notify = sink.close_notify();
        notify.closed().await;

        let err = sink.write(Bytes::from("x")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
