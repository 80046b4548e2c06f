use std::io::{Cursor, Read, Write};

use opcua_types::{BinaryDecodable, BinaryEncodable, StatusCode};

pub const MESSAGE_CHUNK_HEADER_SIZE: usize = 8;
pub const SEQUENCE_HEADER_SIZE: usize = 8;
pub const MESSAGE_SIZE_OFFSET: usize = 4;

/// The four-byte message type that starts every chunk header. `HEL`/`ACK`
/// negotiate the connection, `OPN`/`CLO` open and close the secure
/// channel, and `MSG` carries a service request or response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageChunkType {
    Hello,
    Acknowledge,
    Error,
    OpenSecureChannel,
    CloseSecureChannel,
    Message,
}

impl MessageChunkType {
    pub fn as_bytes(&self) -> [u8; 3] {
        match self {
            MessageChunkType::Hello => *b"HEL",
            MessageChunkType::Acknowledge => *b"ACK",
            MessageChunkType::Error => *b"ERR",
            MessageChunkType::OpenSecureChannel => *b"OPN",
            MessageChunkType::CloseSecureChannel => *b"CLO",
            MessageChunkType::Message => *b"MSG",
        }
    }

    pub fn from_bytes(bytes: [u8; 3]) -> Result<Self, StatusCode> {
        match &bytes {
            b"HEL" => Ok(MessageChunkType::Hello),
            b"ACK" => Ok(MessageChunkType::Acknowledge),
            b"ERR" => Ok(MessageChunkType::Error),
            b"OPN" => Ok(MessageChunkType::OpenSecureChannel),
            b"CLO" => Ok(MessageChunkType::CloseSecureChannel),
            b"MSG" => Ok(MessageChunkType::Message),
            _ => Err(StatusCode::BadTcpMessageTypeInvalid),
        }
    }

    /// Only MSG/OPN/CLO are ever split across multiple chunks; HEL/ACK/ERR
    /// are always a single final chunk.
    pub fn is_chunkable(&self) -> bool {
        matches!(
            self,
            MessageChunkType::Message
                | MessageChunkType::OpenSecureChannel
                | MessageChunkType::CloseSecureChannel
        )
    }
}

/// The final byte of the four-byte message type: `F` (final), `C`
/// (intermediate, more chunks follow), or `A` (abort — the sender gave
/// up mid-message and everything received so far for this request must
/// be discarded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageIsFinalType {
    Final,
    Intermediate,
    Abort,
}

impl MessageIsFinalType {
    pub fn as_byte(&self) -> u8 {
        match self {
            MessageIsFinalType::Final => b'F',
            MessageIsFinalType::Intermediate => b'C',
            MessageIsFinalType::Abort => b'A',
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self, StatusCode> {
        match byte {
            b'F' => Ok(MessageIsFinalType::Final),
            b'C' => Ok(MessageIsFinalType::Intermediate),
            b'A' => Ok(MessageIsFinalType::Abort),
            _ => Err(StatusCode::BadTcpMessageTypeInvalid),
        }
    }
}

/// The 8-byte chunk header: 3-byte message type, 1-byte is-final marker,
/// 4-byte little-endian total chunk size (header included).
#[derive(Debug, Clone, Copy)]
pub struct MessageChunkHeader {
    pub message_type: MessageChunkType,
    pub is_final: MessageIsFinalType,
    pub message_size: u32,
}

impl MessageChunkHeader {
    pub fn decode<R: Read>(stream: &mut R) -> Result<Self, StatusCode> {
        let mut type_bytes = [0u8; 3];
        stream
            .read_exact(&mut type_bytes)
            .map_err(|_| StatusCode::BadDecodingError)?;
        let message_type = MessageChunkType::from_bytes(type_bytes)?;
        let is_final = MessageIsFinalType::from_byte(u8::decode(stream)?)?;
        let message_size = u32::decode(stream)?;
        Ok(Self {
            message_type,
            is_final,
            message_size,
        })
    }

    pub fn encode<W: Write>(&self, stream: &mut W) -> Result<usize, StatusCode> {
        stream
            .write_all(&self.message_type.as_bytes())
            .map_err(|_| StatusCode::BadEncodingError)?;
        let mut n = 3;
        n += self.is_final.as_byte().encode(stream)?;
        n += self.message_size.encode(stream)?;
        Ok(n)
    }
}

/// Extra framing info derived from a decoded chunk, describing which
/// channel/request/sequence number it belongs to and where its body
/// starts, without yet decrypting or verifying it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageChunkInfo {
    pub secure_channel_id: u32,
    pub sequence_number: u32,
    pub request_id: u32,
    pub body_offset: usize,
}

/// A single chunk of a message: its header plus the raw bytes that
/// follow (security header, sequence header, body, padding and
/// signature, still in whatever encryption state it arrived in). The
/// secure channel layer is responsible for decrypting/verifying this
/// into plaintext before [`MessageChunkInfo`] fields beyond the header
/// are trusted.
#[derive(Debug, Clone)]
pub struct MessageChunk {
    pub header: MessageChunkHeader,
    pub data: Vec<u8>,
}

impl MessageChunk {
    pub fn new(
        message_type: MessageChunkType,
        is_final: MessageIsFinalType,
        body: &[u8],
    ) -> Result<Self, StatusCode> {
        let message_size = (MESSAGE_CHUNK_HEADER_SIZE + body.len()) as u32;
        let header = MessageChunkHeader {
            message_type,
            is_final,
            message_size,
        };
        let mut data = Vec::with_capacity(message_size as usize);
        header.encode(&mut data)?;
        data.extend_from_slice(body);
        Ok(Self { header, data })
    }

    pub fn message_header(&self) -> Result<MessageChunkHeader, StatusCode> {
        let mut cursor = Cursor::new(&self.data[..MESSAGE_CHUNK_HEADER_SIZE]);
        MessageChunkHeader::decode(&mut cursor)
    }

    pub fn is_open_secure_channel(&self) -> bool {
        matches!(self.header.message_type, MessageChunkType::OpenSecureChannel)
    }

    pub fn body_size_from_message_size(message_size: u32) -> usize {
        message_size as usize - MESSAGE_CHUNK_HEADER_SIZE
    }

    /// The chunk body, with the 8-byte chunk header stripped off.
    pub fn body(&self) -> &[u8] {
        &self.data[MESSAGE_CHUNK_HEADER_SIZE..]
    }
}
