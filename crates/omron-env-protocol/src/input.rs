//! Normalization of host supplied byte chunks.
//!
//! Hosts hand the parser raw bytes, arrays of byte values, or the JSON
//! interchange form of a byte buffer:
//!
//! ```text
//! { "type": "Buffer", "data": [82, 66, 6, 0, ...] }
//! ```
//!
//! All of them are converted into a [`Chunk`] before any parsing happens.

use std::ops::Deref;

use bytes::Bytes;
use serde_json::Value;

use crate::error::ProtocolError;

/// A chunk of bytes received from the transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk(Bytes);

impl Chunk {
    /// Wrap bytes as a chunk.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Chunk(bytes.into())
    }

    /// The underlying bytes.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Deref for Chunk {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Chunk {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for Chunk {
    fn from(bytes: Bytes) -> Self {
        Chunk(bytes)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Chunk(Bytes::from(bytes))
    }
}

impl From<&[u8]> for Chunk {
    fn from(bytes: &[u8]) -> Self {
        Chunk(Bytes::copy_from_slice(bytes))
    }
}

impl From<&Vec<u8>> for Chunk {
    fn from(bytes: &Vec<u8>) -> Self {
        Chunk::from(bytes.as_slice())
    }
}

impl<const N: usize> From<[u8; N]> for Chunk {
    fn from(bytes: [u8; N]) -> Self {
        Chunk(Bytes::copy_from_slice(&bytes))
    }
}

impl<const N: usize> From<&[u8; N]> for Chunk {
    fn from(bytes: &[u8; N]) -> Self {
        Chunk(Bytes::copy_from_slice(bytes))
    }
}

impl TryFrom<&Value> for Chunk {
    type Error = ProtocolError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(items) => byte_array(items),
            Value::Object(map) => match (map.get("type"), map.get("data")) {
                (Some(Value::String(kind)), Some(Value::Array(items))) if kind == "Buffer" => {
                    byte_array(items)
                }
                _ => Err(unsupported_input()),
            },
            _ => Err(unsupported_input()),
        }
    }
}

impl TryFrom<Value> for Chunk {
    type Error = ProtocolError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Chunk::try_from(&value)
    }
}

fn byte_array(items: &[Value]) -> Result<Chunk, ProtocolError> {
    let bytes = items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| {
                    ProtocolError::InvalidInput(format!(
                        "byte array element {} is not a byte value",
                        item
                    ))
                })
        })
        .collect::<Result<Vec<u8>, _>>()?;
    Ok(Chunk::from(bytes))
}

fn unsupported_input() -> ProtocolError {
    ProtocolError::InvalidInput(
        "The passed data buffer must be either int array or Buffer.".to_string(),
    )
}
