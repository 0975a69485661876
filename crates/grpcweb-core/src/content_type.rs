//! Content-type tokens and the header names the bridge reads or writes.
//!
//! Tokens are compared by exact, case-sensitive match.

/// Native gRPC
pub const GRPC: &str = "application/grpc";

/// gRPC-Web, binary, generic subtype
pub const GRPC_WEB: &str = "application/grpc-web";

/// gRPC-Web, binary, explicit proto subtype
pub const GRPC_WEB_PROTO: &str = "application/grpc-web+proto";

/// gRPC-Web, base64 text, generic subtype
pub const GRPC_WEB_TEXT: &str = "application/grpc-web-text";

/// gRPC-Web, base64 text, explicit proto subtype
pub const GRPC_WEB_TEXT_PROTO: &str = "application/grpc-web-text+proto";

/// Encodings advertised to the wrapped handler
pub const ACCEPTED_ENCODINGS: &str = "identity,deflate,gzip";

/// `grpc-accept-encoding` header name
pub const GRPC_ACCEPT_ENCODING: &str = "grpc-accept-encoding";

/// Returns true for any of the four gRPC-Web tokens.
pub fn is_grpc_web(value: &str) -> bool {
    matches!(
        value,
        GRPC_WEB | GRPC_WEB_PROTO | GRPC_WEB_TEXT | GRPC_WEB_TEXT_PROTO
    )
}

/// Returns true for the base64 text variants.
pub fn is_grpc_web_text(value: &str) -> bool {
    matches!(value, GRPC_WEB_TEXT | GRPC_WEB_TEXT_PROTO)
}

/// Returns true when the value starts with the native gRPC token.
///
/// Suffixes such as `+proto` or `+json` are accepted.
pub fn is_grpc(value: &str) -> bool {
    value.starts_with(GRPC)
}
