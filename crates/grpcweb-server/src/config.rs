//! Server configuration

use serde::Deserialize;

/// Configuration for the hyper host
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Response body chunks buffered before writes wait on the client
    pub body_buffer: usize,
    /// HTTP/1.1 keep-alive
    pub http1_keep_alive: bool,
    /// HTTP/2 max concurrent streams (None = hyper default)
    pub http2_max_concurrent_streams: Option<u32>,
    /// Emit declared trailers as real HTTP/2 trailers for HTTP/2 requests
    pub http2_trailers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            body_buffer: 16,
            http1_keep_alive: true,
            http2_max_concurrent_streams: None,
            http2_trailers: true,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of buffered response body chunks
    pub fn body_buffer(mut self, chunks: usize) -> Self {
        self.body_buffer = chunks.max(1);
        self
    }

    /// Enable or disable HTTP/1.1 keep-alive
    pub fn http1_keep_alive(mut self, enabled: bool) -> Self {
        self.http1_keep_alive = enabled;
        self
    }

    /// Limit concurrent HTTP/2 streams per connection
    pub fn http2_max_concurrent_streams(mut self, max: u32) -> Self {
        self.http2_max_concurrent_streams = Some(max);
        self
    }

    /// Enable or disable native HTTP/2 trailers
    pub fn http2_trailers(mut self, enabled: bool) -> Self {
        self.http2_trailers = enabled;
        self
    }
}
