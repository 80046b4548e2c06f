use std::fmt;
use std::io::{Read, Write};

use crate::encoding::{
    read_bytes, read_string, write_bytes, write_string, BinaryDecodable, BinaryEncodable,
};
use crate::status_code::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Numeric(u32),
    String(String),
    Guid(uuid::Uuid),
    ByteString(Vec<u8>),
}

/// A node identifier: a namespace index plus one of four identifier
/// kinds. Equality and hashing are structural, so `NodeId` can key a
/// `HashMap` directly the way the address-space and monitored-item
/// tables need.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub namespace_index: u16,
    pub identifier: Identifier,
}

impl NodeId {
    pub fn new(namespace_index: u16, identifier: impl Into<Identifier>) -> Self {
        Self {
            namespace_index,
            identifier: identifier.into(),
        }
    }

    pub fn null() -> Self {
        Self {
            namespace_index: 0,
            identifier: Identifier::Numeric(0),
        }
    }

    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && matches!(self.identifier, Identifier::Numeric(0))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl From<u32> for Identifier {
    fn from(v: u32) -> Self {
        Identifier::Numeric(v)
    }
}

impl From<String> for Identifier {
    fn from(v: String) -> Self {
        Identifier::String(v)
    }
}

impl From<&str> for Identifier {
    fn from(v: &str) -> Self {
        Identifier::String(v.to_string())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            Identifier::Numeric(n) => write!(f, "ns={};i={}", self.namespace_index, n),
            Identifier::String(s) => write!(f, "ns={};s={}", self.namespace_index, s),
            Identifier::Guid(g) => write!(f, "ns={};g={}", self.namespace_index, g),
            Identifier::ByteString(_) => write!(f, "ns={};b=<bytes>", self.namespace_index),
        }
    }
}

impl BinaryEncodable for NodeId {
    fn byte_len(&self) -> usize {
        match &self.identifier {
            Identifier::Numeric(n) if self.namespace_index == 0 && *n <= 255 => 2,
            Identifier::Numeric(n) if self.namespace_index <= 255 && *n <= 65535 => 4,
            Identifier::Numeric(_) => 7,
            Identifier::String(s) => 3 + crate::encoding::string_byte_len(&Some(s.clone())),
            Identifier::Guid(_) => 19,
            Identifier::ByteString(b) => 3 + crate::encoding::bytes_byte_len(&Some(b.clone())),
        }
    }

    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        match &self.identifier {
            Identifier::Numeric(n) if self.namespace_index == 0 && *n <= 255 => {
                let mut len = 0u8.encode(stream)?;
                len += (*n as u8).encode(stream)?;
                Ok(len)
            }
            Identifier::Numeric(n) if self.namespace_index <= 255 && *n <= 65535 => {
                let mut len = 1u8.encode(stream)?;
                len += (self.namespace_index as u8).encode(stream)?;
                len += (*n as u16).encode(stream)?;
                Ok(len)
            }
            Identifier::Numeric(n) => {
                let mut len = 2u8.encode(stream)?;
                len += self.namespace_index.encode(stream)?;
                len += n.encode(stream)?;
                Ok(len)
            }
            Identifier::String(s) => {
                let mut len = 3u8.encode(stream)?;
                len += self.namespace_index.encode(stream)?;
                len += write_string(&Some(s.clone()), stream)?;
                Ok(len)
            }
            Identifier::Guid(g) => {
                let mut len = 4u8.encode(stream)?;
                len += self.namespace_index.encode(stream)?;
                stream
                    .write_all(g.as_bytes())
                    .map_err(|_| StatusCode::BadEncodingError)?;
                len += 16;
                Ok(len)
            }
            Identifier::ByteString(b) => {
                let mut len = 5u8.encode(stream)?;
                len += self.namespace_index.encode(stream)?;
                len += write_bytes(&Some(b.clone()), stream)?;
                Ok(len)
            }
        }
    }
}

impl BinaryDecodable for NodeId {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        let encoding = u8::decode(stream)?;
        match encoding {
            0 => {
                let id = u8::decode(stream)?;
                Ok(NodeId::new(0, id as u32))
            }
            1 => {
                let ns = u8::decode(stream)?;
                let id = u16::decode(stream)?;
                Ok(NodeId::new(ns as u16, id as u32))
            }
            2 => {
                let ns = u16::decode(stream)?;
                let id = u32::decode(stream)?;
                Ok(NodeId::new(ns, id))
            }
            3 => {
                let ns = u16::decode(stream)?;
                let s = read_string(stream)?.unwrap_or_default();
                Ok(NodeId::new(ns, s))
            }
            4 => {
                let ns = u16::decode(stream)?;
                let mut buf = [0u8; 16];
                stream
                    .read_exact(&mut buf)
                    .map_err(|_| StatusCode::BadDecodingError)?;
                Ok(NodeId {
                    namespace_index: ns,
                    identifier: Identifier::Guid(uuid::Uuid::from_bytes(buf)),
                })
            }
            5 => {
                let ns = u16::decode(stream)?;
                let b = read_bytes(stream)?.unwrap_or_default();
                Ok(NodeId {
                    namespace_index: ns,
                    identifier: Identifier::ByteString(b),
                })
            }
            _ => Err(StatusCode::BadDecodingError),
        }
    }
}
