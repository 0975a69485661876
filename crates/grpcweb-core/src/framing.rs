//! Length-prefixed framing shared by gRPC and gRPC-Web.
//!
//! Frame format: [flags byte][length u32 big-endian][payload bytes]
//! Flags: COMPRESSED(bit 0), TRAILERS(bit 7)

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Size of the flags byte plus the length prefix
pub const HEADER_SIZE: usize = 5;

/// Maximum frame size (4MB)
pub const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Frame flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFlags(u8);

impl FrameFlags {
    pub const COMPRESSED: u8 = 0b0000_0001;
    pub const TRAILERS: u8 = 0b1000_0000;

    pub fn new(flags: u8) -> Self {
        Self(flags)
    }

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn is_compressed(&self) -> bool {
        self.0 & Self::COMPRESSED != 0
    }

    /// Set for the in-band trailer record of a gRPC-Web response
    pub fn is_trailers(&self) -> bool {
        self.0 & Self::TRAILERS != 0
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

/// A single length-prefixed frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub flags: FrameFlags,
    pub payload: Bytes,
}

impl Frame {
    /// Create an uncompressed message frame
    pub fn message(payload: Bytes) -> Self {
        Self {
            flags: FrameFlags::empty(),
            payload,
        }
    }

    /// Create a trailer frame carrying a serialized trailer block
    pub fn trailers(payload: Bytes) -> Self {
        Self {
            flags: FrameFlags::new(FrameFlags::TRAILERS),
            payload,
        }
    }

    /// Encode this frame to bytes
    pub fn encode(&self) -> Bytes {
        debug_assert!(self.payload.len() <= u32::MAX as usize);
        let payload_len = self.payload.len() as u32;
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());

        buf.put_u8(self.flags.as_u8());
        buf.put_u32(payload_len);
        buf.put_slice(&self.payload);

        buf.freeze()
    }
}

/// Frame parser for decoding frames from a byte stream
pub struct FrameParser {
    buffer: BytesMut,
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Add data to the parser buffer
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Bytes received but not yet consumed by a complete frame
    pub fn remaining(&self) -> usize {
        self.buffer.len()
    }

    /// Try to parse a complete frame from the buffer
    pub fn parse_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        if self.buffer.len() < HEADER_SIZE {
            return Ok(None);
        }

        let flags = FrameFlags::new(self.buffer[0]);
        let payload_len = (&self.buffer[1..HEADER_SIZE]).get_u32() as usize;

        if payload_len > MAX_FRAME_SIZE {
            return Err(FrameError::FrameTooLarge(payload_len));
        }

        if self.buffer.len() < HEADER_SIZE + payload_len {
            return Ok(None); // Need more data
        }

        self.buffer.advance(HEADER_SIZE);
        let payload = self.buffer.split_to(payload_len).freeze();

        Ok(Some(Frame { flags, payload }))
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Frame too large: {0} bytes (max {MAX_FRAME_SIZE})")]
    FrameTooLarge(usize),
}
