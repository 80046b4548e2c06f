use std::io::{Read, Write};

use chrono::{DateTime as ChronoDateTime, Utc};

use crate::encoding::{read_string, write_string, BinaryDecodable, BinaryEncodable};
use crate::status_code::StatusCode;

/// OPC UA's epoch is 1601-01-01; the wire format is the number of
/// 100-nanosecond intervals since then, stored as an `i64`. We keep a
/// `chrono::DateTime<Utc>` internally and only do the epoch conversion at
/// the encode/decode boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UaDateTime(pub ChronoDateTime<Utc>);

const OPCUA_EPOCH_OFFSET_100NS: i64 = 116_444_736_000_000_000;

impl UaDateTime {
    pub fn from_chrono(dt: ChronoDateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn now_from(dt: ChronoDateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn ticks(&self) -> i64 {
        let micros = self.0.timestamp_micros();
        micros.saturating_mul(10).saturating_add(OPCUA_EPOCH_OFFSET_100NS)
    }

    pub fn from_ticks(ticks: i64) -> Self {
        let micros = (ticks - OPCUA_EPOCH_OFFSET_100NS) / 10;
        let secs = micros.div_euclid(1_000_000);
        let nanos = (micros.rem_euclid(1_000_000) * 1000) as u32;
        Self(
            ChronoDateTime::from_timestamp(secs, nanos)
                .unwrap_or_else(|| ChronoDateTime::from_timestamp(0, 0).unwrap()),
        )
    }
}

impl BinaryEncodable for UaDateTime {
    fn byte_len(&self) -> usize {
        8
    }
    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        self.ticks().encode(stream)
    }
}

impl BinaryDecodable for UaDateTime {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        Ok(Self::from_ticks(i64::decode(stream)?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub namespace_index: u16,
    pub name: Option<String>,
}

impl QualifiedName {
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: Some(name.into()),
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        QualifiedName::new(0, s)
    }
}

impl BinaryEncodable for QualifiedName {
    fn byte_len(&self) -> usize {
        2 + crate::encoding::string_byte_len(&self.name)
    }
    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        let mut n = self.namespace_index.encode(stream)?;
        n += write_string(&self.name, stream)?;
        Ok(n)
    }
}

impl BinaryDecodable for QualifiedName {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        let namespace_index = u16::decode(stream)?;
        let name = read_string(stream)?;
        Ok(Self {
            namespace_index,
            name,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedText {
    pub locale: Option<String>,
    pub text: Option<String>,
}

impl LocalizedText {
    pub fn new(locale: &str, text: &str) -> Self {
        Self {
            locale: Some(locale.to_string()),
            text: Some(text.to_string()),
        }
    }
}

impl From<&str> for LocalizedText {
    fn from(s: &str) -> Self {
        LocalizedText {
            locale: None,
            text: Some(s.to_string()),
        }
    }
}

impl BinaryEncodable for LocalizedText {
    fn byte_len(&self) -> usize {
        let mut encoding_mask = 0u8;
        if self.locale.is_some() {
            encoding_mask |= 1;
        }
        if self.text.is_some() {
            encoding_mask |= 2;
        }
        let mut len = 1;
        if self.locale.is_some() {
            len += crate::encoding::string_byte_len(&self.locale);
        }
        if self.text.is_some() {
            len += crate::encoding::string_byte_len(&self.text);
        }
        let _ = encoding_mask;
        len
    }

    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        let mut encoding_mask = 0u8;
        if self.locale.is_some() {
            encoding_mask |= 1;
        }
        if self.text.is_some() {
            encoding_mask |= 2;
        }
        let mut n = encoding_mask.encode(stream)?;
        if let Some(locale) = &self.locale {
            n += write_string(&Some(locale.clone()), stream)?;
        }
        if let Some(text) = &self.text {
            n += write_string(&Some(text.clone()), stream)?;
        }
        Ok(n)
    }
}

impl BinaryDecodable for LocalizedText {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        let encoding_mask = u8::decode(stream)?;
        let locale = if encoding_mask & 1 != 0 {
            read_string(stream)?
        } else {
            None
        };
        let text = if encoding_mask & 2 != 0 {
            read_string(stream)?
        } else {
            None
        };
        Ok(Self { locale, text })
    }
}

/// A `ByteString` is just `Option<Vec<u8>>` with `-1` length meaning
/// null, the same rule as strings; kept as a newtype so call sites read
/// clearly and so `Range`/`ExtensionObject` payloads can implement
/// `BinaryEncodable`/`BinaryDecodable` directly on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteString(pub Option<Vec<u8>>);

impl BinaryEncodable for ByteString {
    fn byte_len(&self) -> usize {
        crate::encoding::bytes_byte_len(&self.0)
    }
    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        crate::encoding::write_bytes(&self.0, stream)
    }
}

impl BinaryDecodable for ByteString {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        Ok(Self(crate::encoding::read_bytes(stream)?))
    }
}

/// `Range` is the `EURange`-property payload: the engineering-unit low
/// and high bounds used to resolve percent-deadband filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub low: f64,
    pub high: f64,
}

/// A minimal typed container standing in for the wire `ExtensionObject`:
/// rather than modelling the generic binary/XML/JSON body encoding, this
/// crate only ever needs to carry a handful of known payload types
/// (filters, ranges) between layers, so the body is a closed enum.
#[derive(Debug, Clone)]
pub enum ExtensionObject {
    Null,
    DataChangeFilter(crate::service_types::DataChangeFilter),
    EventFilter(crate::service_types::EventFilter),
    Range(Range),
}

impl Default for ExtensionObject {
    fn default() -> Self {
        ExtensionObject::Null
    }
}

impl ExtensionObject {
    pub fn inner_as_data_change_filter(&self) -> Option<&crate::service_types::DataChangeFilter> {
        match self {
            ExtensionObject::DataChangeFilter(f) => Some(f),
            _ => None,
        }
    }

    pub fn inner_as_event_filter(&self) -> Option<&crate::service_types::EventFilter> {
        match self {
            ExtensionObject::EventFilter(f) => Some(f),
            _ => None,
        }
    }

    pub fn inner_as_range(&self) -> Option<Range> {
        match self {
            ExtensionObject::Range(r) => Some(*r),
            _ => None,
        }
    }
}
