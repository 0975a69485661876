//! Hyper-based host for the gRPC-Web bridge.
//!
//! This crate provides the transport side the bridge plugs into:
//! - A [`ResponseSink`](grpcweb_core::ResponseSink) over a hyper response
//! - A streaming response body with disconnect notification
//! - Server runtime dispatching gRPC, gRPC-Web and fallback requests
//! - Server configuration

pub mod body;
pub mod config;
pub mod error;
pub mod server;
pub mod sink;

pub use body::ResponseBody;
pub use config::ServerConfig;
pub use error::ServerError;
pub use server::{GrpcWebServer, ServerBuilder};
pub use sink::ChannelSink;
