//! Request body adapter decoding `grpc-web-text` payloads

use bytes::Bytes;
use grpcweb_core::{Base64Decoder, BoxError};
use http_body::{Body, Frame};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

pin_project! {
    /// Body that base64-decodes the wrapped body as it is read.
    ///
    /// Decoding is lazy: malformed input surfaces as an error frame when the
    /// consumer reaches it. Errors from the wrapped body pass through
    /// unchanged, and dropping this body drops the wrapped one.
    pub struct Base64DecodeBody<B> {
        #[pin]
        inner: B,
        decoder: Base64Decoder,
        done: bool,
    }
}

impl<B> Base64DecodeBody<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            decoder: Base64Decoder::new(),
            done: false,
        }
    }
}

impl<B> Body for Base64DecodeBody<B>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();

        loop {
            if *this.done {
                return Poll::Ready(None);
            }

            match ready!(this.inner.as_mut().poll_frame(cx)) {
                Some(Ok(frame)) => {
                    let data = match frame.into_data() {
                        Ok(data) => data,
                        // Request trailers are forwarded as-is
                        Err(frame) => return Poll::Ready(Some(Ok(frame))),
                    };
                    match this.decoder.decode(&data) {
                        Ok(decoded) if decoded.is_empty() => continue,
                        Ok(decoded) => return Poll::Ready(Some(Ok(Frame::data(decoded)))),
                        Err(err) => {
                            *this.done = true;
                            return Poll::Ready(Some(Err(err.into())));
                        }
                    }
                }
                Some(Err(err)) => return Poll::Ready(Some(Err(err.into()))),
                None => {
                    *this.done = true;
                    return match this.decoder.finish() {
                        Ok(()) => Poll::Ready(None),
                        Err(err) => Poll::Ready(Some(Err(err.into()))),
                    };
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.done
    }
}
