//! Trailing metadata collection and in-band trailer framing
//!
//! gRPC-Web carries trailing metadata as a final length-prefixed record in the
//! response body, flagged with `0x80`, holding `Name: Value\r\n` lines.

use bytes::{BufMut, Bytes, BytesMut};
use grpcweb_core::Frame;
use http::header::TRAILER;
use http::{HeaderMap, HeaderName, HeaderValue};

/// Trailing metadata fields, kept sorted by canonical name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrailerBlock {
    fields: Vec<(HeaderName, HeaderValue)>,
}

impl TrailerBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the fields named by the `trailer` header(s).
    ///
    /// Every `trailer` value may hold one name or a comma-separated list.
    /// Names that are missing, empty or not valid header names are skipped.
    pub fn from_declared(headers: &HeaderMap) -> Self {
        let mut block = Self::new();

        for declared in headers.get_all(TRAILER) {
            let Ok(list) = declared.to_str() else {
                continue;
            };
            for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                    continue;
                };
                match headers.get(&name) {
                    Some(value) if !value.is_empty() => block.insert(name, value.clone()),
                    _ => {}
                }
            }
        }

        block
    }

    /// Set a field at its sorted position; a repeated name is stored once.
    pub fn insert(&mut self, name: HeaderName, value: HeaderValue) {
        let key = canonical_name(&name);
        match self
            .fields
            .binary_search_by(|(n, _)| canonical_name(n).cmp(&key))
        {
            Ok(index) => self.fields[index].1 = value,
            Err(index) => self.fields.insert(index, (name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.fields.iter().map(|(n, v)| (n, v))
    }

    /// Serialize as `Name: Value\r\n` lines with canonical names, in
    /// ascending name order.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        for (name, value) in &self.fields {
            buf.put_slice(canonical_name(name).as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }
        buf.freeze()
    }

    /// Build the complete trailer frame: `0x80`, u32 length, block bytes.
    pub fn to_frame(&self) -> Bytes {
        Frame::trailers(self.encode()).encode()
    }

    /// Convert into a header map, e.g. for native HTTP/2 trailers.
    pub fn into_header_map(self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.fields.len());
        for (name, value) in self.fields {
            map.insert(name, value);
        }
        map
    }
}

/// Canonical MIME form of a header name: `grpc-status` → `Grpc-Status`.
pub fn canonical_name(name: &HeaderName) -> String {
    let mut out = String::with_capacity(name.as_str().len());
    let mut upper = true;
    for c in name.as_str().chars() {
        if upper {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        upper = c == '-';
    }
    out
}
