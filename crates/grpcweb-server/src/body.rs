//! Streaming response body fed by a [`ChannelSink`](crate::ChannelSink)

use bytes::Bytes;
use grpcweb_core::CloseGuard;
use http_body::{Body, Frame};
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Response body receiving frames from the request's handler task.
///
/// Dropping the body, which hyper does when the client disconnects or the
/// response completes, fires the sink's close notification.
pub struct ResponseBody {
    rx: mpsc::Receiver<Frame<Bytes>>,
    _guard: CloseGuard,
}

impl ResponseBody {
    pub(crate) fn new(rx: mpsc::Receiver<Frame<Bytes>>, guard: CloseGuard) -> Self {
        Self { rx, _guard: guard }
    }

    /// Body that ends immediately
    pub fn empty() -> Self {
        let (_, rx) = mpsc::channel(1);
        let (guard, _) = grpcweb_core::close_pair();
        Self::new(rx, guard)
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.rx.poll_recv(cx).map(|frame| frame.map(Ok))
    }
}
