use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::status_code::StatusCode;

/// Mirrors the wire-encoding traits of the reference OPC UA binary codec:
/// every structured type knows its own encoded byte length, how to write
/// itself, and how to read itself back. All multi-byte integers are
/// little-endian; strings and arrays are length-prefixed `i32`s with `-1`
/// meaning "null" rather than "empty".
pub trait BinaryEncodable {
    fn byte_len(&self) -> usize;
    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode>;
}

pub trait BinaryDecodable: Sized {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode>;
}

macro_rules! impl_primitive {
    ($t:ty, $write:ident, $read:ident) => {
        impl BinaryEncodable for $t {
            fn byte_len(&self) -> usize {
                std::mem::size_of::<$t>()
            }
            fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
                stream
                    .$write::<LittleEndian>(*self)
                    .map_err(|_| StatusCode::BadEncodingError)?;
                Ok(self.byte_len())
            }
        }
        impl BinaryDecodable for $t {
            fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
                stream
                    .$read::<LittleEndian>()
                    .map_err(|_| StatusCode::BadDecodingError)
            }
        }
    };
}

impl_primitive!(u16, write_u16, read_u16);
impl_primitive!(i16, write_i16, read_i16);
impl_primitive!(u32, write_u32, read_u32);
impl_primitive!(i32, write_i32, read_i32);
impl_primitive!(u64, write_u64, read_u64);
impl_primitive!(i64, write_i64, read_i64);
impl_primitive!(f32, write_f32, read_f32);
impl_primitive!(f64, write_f64, read_f64);

impl BinaryEncodable for u8 {
    fn byte_len(&self) -> usize {
        1
    }
    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        stream
            .write_u8(*self)
            .map_err(|_| StatusCode::BadEncodingError)?;
        Ok(1)
    }
}

impl BinaryDecodable for u8 {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        stream.read_u8().map_err(|_| StatusCode::BadDecodingError)
    }
}

impl BinaryEncodable for bool {
    fn byte_len(&self) -> usize {
        1
    }
    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        (*self as u8).encode(stream)
    }
}

impl BinaryDecodable for bool {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        Ok(u8::decode(stream)? != 0)
    }
}

/// Writes a length-prefixed UTF-8 string, `-1` length for `None`.
pub fn write_string<S: Write>(v: &Option<String>, stream: &mut S) -> Result<usize, StatusCode> {
    match v {
        None => (-1i32).encode(stream),
        Some(s) => {
            let bytes = s.as_bytes();
            let mut n = (bytes.len() as i32).encode(stream)?;
            stream
                .write_all(bytes)
                .map_err(|_| StatusCode::BadEncodingError)?;
            n += bytes.len();
            Ok(n)
        }
    }
}

pub fn read_string<S: Read>(stream: &mut S) -> Result<Option<String>, StatusCode> {
    let len = i32::decode(stream)?;
    if len < 0 {
        return Ok(None);
    }
    let len = len as usize;
    if len > crate::constants::MAX_STRING_LENGTH {
        return Err(StatusCode::BadEncodingLimitsExceeded);
    }
    let mut buf = vec![0u8; len];
    stream
        .read_exact(&mut buf)
        .map_err(|_| StatusCode::BadDecodingError)?;
    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| StatusCode::BadDecodingError)
}

pub fn string_byte_len(v: &Option<String>) -> usize {
    4 + v.as_ref().map(|s| s.len()).unwrap_or(0)
}

pub fn write_bytes<S: Write>(v: &Option<Vec<u8>>, stream: &mut S) -> Result<usize, StatusCode> {
    match v {
        None => (-1i32).encode(stream),
        Some(b) => {
            let mut n = (b.len() as i32).encode(stream)?;
            stream
                .write_all(b)
                .map_err(|_| StatusCode::BadEncodingError)?;
            n += b.len();
            Ok(n)
        }
    }
}

pub fn read_bytes<S: Read>(stream: &mut S) -> Result<Option<Vec<u8>>, StatusCode> {
    let len = i32::decode(stream)?;
    if len < 0 {
        return Ok(None);
    }
    let len = len as usize;
    if len > crate::constants::MAX_BYTE_STRING_LENGTH {
        return Err(StatusCode::BadEncodingLimitsExceeded);
    }
    let mut buf = vec![0u8; len];
    stream
        .read_exact(&mut buf)
        .map_err(|_| StatusCode::BadDecodingError)?;
    Ok(Some(buf))
}

pub fn bytes_byte_len(v: &Option<Vec<u8>>) -> usize {
    4 + v.as_ref().map(|b| b.len()).unwrap_or(0)
}

/// Writes a length-prefixed array of encodable items, `-1` for `None`.
pub fn write_array<S: Write, T: BinaryEncodable>(
    v: &Option<Vec<T>>,
    stream: &mut S,
) -> Result<usize, StatusCode> {
    match v {
        None => (-1i32).encode(stream),
        Some(items) => {
            let mut n = (items.len() as i32).encode(stream)?;
            for item in items {
                n += item.encode(stream)?;
            }
            Ok(n)
        }
    }
}

pub fn read_array<S: Read, T: BinaryDecodable>(
    stream: &mut S,
) -> Result<Option<Vec<T>>, StatusCode> {
    let len = i32::decode(stream)?;
    if len < 0 {
        return Ok(None);
    }
    let len = len as usize;
    if len > crate::constants::MAX_ARRAY_LENGTH {
        return Err(StatusCode::BadEncodingLimitsExceeded);
    }
    let mut items = Vec::with_capacity(len.min(4096));
    for _ in 0..len {
        items.push(T::decode(stream)?);
    }
    Ok(Some(items))
}

pub fn array_byte_len<T: BinaryEncodable>(v: &Option<Vec<T>>) -> usize {
    4 + v
        .as_ref()
        .map(|items| items.iter().map(|i| i.byte_len()).sum())
        .unwrap_or(0)
}
