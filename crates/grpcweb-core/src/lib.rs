//! Core types for the gRPC-Web bridge.
//!
//! This crate provides the foundation types used across all bridge components:
//! - Content-type tokens for gRPC and gRPC-Web
//! - Length-prefixed message and trailer framing
//! - Streaming base64 codec for the text variants
//! - Response sink and handler capability traits

pub mod codec;
pub mod content_type;
pub mod error;
pub mod framing;
pub mod handler;
pub mod sink;

pub use codec::{Base64Decoder, Base64Encoder};
pub use error::DecodeError;
pub use framing::{Frame, FrameError, FrameFlags, FrameParser};
pub use handler::{BoxBody, BoxError, Handler, NotFound};
pub use sink::{close_pair, CloseGuard, CloseNotify, MemorySink, ResponseSink};
