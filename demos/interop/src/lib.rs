//! gRPC-Web interop demo
//!
//! A minimal `grpc.testing.TestService` (EmptyCall, UnaryCall and
//! StreamingOutputCall) written as a canonical gRPC handler, served to both
//! gRPC and gRPC-Web clients through the bridge.

pub mod messages;
pub mod service;
pub mod status;

pub use service::TestService;
pub use status::{Code, Status};
