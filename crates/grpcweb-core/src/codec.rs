//! Streaming base64 codec for the `grpc-web-text` content types.
//!
//! Both halves accept input in arbitrary chunk sizes and carry the partial
//! quantum over to the next call. The encoder only emits padding from
//! [`Base64Encoder::finish`], so a single encoder instance produces one
//! continuous base64 run no matter how its input was split.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::Engine;
use bytes::Bytes;

use crate::error::DecodeError;

/// Standard alphabet, padding required, non-zero trailing bits ignored
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Incremental base64 encoder (standard alphabet, padded)
#[derive(Debug, Default)]
pub struct Base64Encoder {
    // Fewer than 3 bytes waiting for a complete group
    pending: Vec<u8>,
}

impl Base64Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode as many complete 3-byte groups as are available.
    pub fn encode(&mut self, input: &[u8]) -> Bytes {
        let total = self.pending.len() + input.len();
        let whole = total - total % 3;
        if whole == 0 {
            self.pending.extend_from_slice(input);
            return Bytes::new();
        }

        let take = whole - self.pending.len();
        let mut group = std::mem::take(&mut self.pending);
        group.extend_from_slice(&input[..take]);
        self.pending.extend_from_slice(&input[take..]);

        Bytes::from(STANDARD.encode(&group))
    }

    /// Encode the remaining partial group with padding.
    ///
    /// The encoder is empty afterwards and may be reused for a new run.
    pub fn finish(&mut self) -> Bytes {
        if self.pending.is_empty() {
            return Bytes::new();
        }
        let tail = STANDARD.encode(&self.pending);
        self.pending.clear();
        Bytes::from(tail)
    }
}

/// Incremental base64 decoder (standard alphabet)
///
/// Each 4-character quantum is decoded independently, so a stream made of
/// several padded runs concatenated together decodes to the concatenation of
/// their contents. ASCII CR and LF are skipped.
#[derive(Debug, Default)]
pub struct Base64Decoder {
    // Fewer than 4 characters waiting for a complete quantum
    pending: Vec<u8>,
}

impl Base64Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every complete quantum available so far.
    pub fn decode(&mut self, input: &[u8]) -> Result<Bytes, DecodeError> {
        let mut chars = std::mem::take(&mut self.pending);
        chars.extend(input.iter().copied().filter(|b| *b != b'\r' && *b != b'\n'));

        let whole = chars.len() - chars.len() % 4;
        self.pending = chars.split_off(whole);

        let mut out = Vec::with_capacity(whole / 4 * 3);
        let mut start = 0;
        for (index, quantum) in chars.chunks_exact(4).enumerate() {
            // A padded quantum ends a run; decode up to and including it.
            if quantum.contains(&b'=') {
                let end = (index + 1) * 4;
                LENIENT.decode_vec(&chars[start..end], &mut out)?;
                start = end;
            }
        }
        if start < chars.len() {
            LENIENT.decode_vec(&chars[start..], &mut out)?;
        }

        Ok(Bytes::from(out))
    }

    /// Check that the input ended on a quantum boundary.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            self.pending.clear();
            Err(DecodeError::UnexpectedEof)
        }
    }
}
