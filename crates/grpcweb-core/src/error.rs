//! Error types.

/// Failure while decoding a base64 text body.
///
/// Surfaced to whichever component consumes the request body; the bridge
/// itself never inspects it.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The stream ended in the middle of a 4-character quantum.
    #[error("unexpected EOF")]
    UnexpectedEof,

    #[error("illegal base64 data: {0}")]
    Base64(#[from] base64::DecodeError),
}
