//! gRPC-Web to gRPC bridge
//!
//! Lets a browser client speaking gRPC-Web reach a handler that only
//! understands canonical gRPC over HTTP/2.
//!
//! # Features
//!
//! - Content-type classification (gRPC-Web, native gRPC, other)
//! - Request transcoding, including streaming base64 decoding of text bodies
//! - Response transcoding, including per-flush base64 runs for text output
//! - In-band trailer frames built from declared trailing metadata
//! - Three-way dispatch between gRPC-Web, gRPC and a fallback handler

pub mod body;
pub mod classify;
pub mod dispatch;
pub mod request;
pub mod response;
pub mod trailers;
pub mod web;

pub use body::Base64DecodeBody;
pub use classify::{classify, is_grpc_request, is_grpc_web_request, RequestKind};
pub use dispatch::Dispatcher;
pub use request::transcode_request;
pub use response::{EncodingMode, GrpcWebResponse};
pub use trailers::{canonical_name, TrailerBlock};
pub use web::GrpcWeb;
