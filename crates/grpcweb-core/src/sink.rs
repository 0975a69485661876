//! Response sink capability trait and close notification.
//!
//! A sink is the outbound half of one HTTP exchange: a header map, a status
//! line, a byte stream that can be flushed, and a notification that fires when
//! the client goes away. Hosts implement it over their transport; the gRPC-Web
//! response transcoder implements it by wrapping another sink.

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use std::future::Future;
use std::io;
use tokio::sync::watch;

/// Outbound side of a single request
pub trait ResponseSink: Send {
    /// Response headers. Changes after the head is committed are still
    /// visible here, which is how handlers record trailing metadata.
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Set the status code and commit the response head.
    fn set_status(&mut self, status: StatusCode);

    /// Write body bytes, committing the head with `200 OK` if needed.
    fn write(&mut self, data: Bytes) -> impl Future<Output = io::Result<()>> + Send;

    /// Push buffered bytes to the client.
    fn flush(&mut self) -> impl Future<Output = io::Result<()>> + Send;

    /// Handle that resolves once the client has gone away.
    fn close_notify(&self) -> CloseNotify;
}

/// Held by the transport; dropping it signals every paired [`CloseNotify`].
#[derive(Debug)]
pub struct CloseGuard {
    _tx: watch::Sender<()>,
}

/// Cloneable notification of client disconnect
#[derive(Debug, Clone)]
pub struct CloseNotify {
    rx: Option<watch::Receiver<()>>,
}

/// Create a connected guard / notifier pair.
pub fn close_pair() -> (CloseGuard, CloseNotify) {
    let (tx, rx) = watch::channel(());
    (CloseGuard { _tx: tx }, CloseNotify { rx: Some(rx) })
}

impl CloseNotify {
    /// A notifier that never fires
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Returns true once the paired guard has been dropped.
    pub fn is_closed(&self) -> bool {
        match &self.rx {
            Some(rx) => rx.has_changed().is_err(),
            None => false,
        }
    }

    /// Wait until the paired guard has been dropped.
    pub async fn closed(&mut self) {
        match &mut self.rx {
            Some(rx) => while rx.changed().await.is_ok() {},
            None => std::future::pending().await,
        }
    }
}

/// In-memory sink that records everything written to it
///
/// Useful for embedding the bridge without a network transport and for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    status: Option<StatusCode>,
    headers: HeaderMap,
    committed: Option<HeaderMap>,
    body: BytesMut,
    flushes: usize,
    write_failure: Option<io::ErrorKind>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with the given error kind.
    pub fn fail_writes(&mut self, kind: io::ErrorKind) {
        self.write_failure = Some(kind);
    }

    /// Status committed so far, if any
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Snapshot of the headers at the moment the head was committed
    pub fn committed_headers(&self) -> Option<&HeaderMap> {
        self.committed.as_ref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Number of flush calls that reached this sink
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    fn commit(&mut self, status: StatusCode) {
        if self.committed.is_none() {
            self.status = Some(status);
            self.committed = Some(self.headers.clone());
        }
    }
}

impl ResponseSink for MemorySink {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_status(&mut self, status: StatusCode) {
        self.commit(status);
    }

    async fn write(&mut self, data: Bytes) -> io::Result<()> {
        if let Some(kind) = self.write_failure {
            return Err(io::Error::new(kind, "write failed"));
        }
        self.commit(StatusCode::OK);
        self.body.extend_from_slice(&data);
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.commit(StatusCode::OK);
        self.flushes += 1;
        Ok(())
    }

    fn close_notify(&self) -> CloseNotify {
        CloseNotify::never()
    }
}
