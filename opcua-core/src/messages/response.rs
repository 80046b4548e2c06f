use std::io::{Read, Write};

use opcua_types::{BinaryDecodable, BinaryEncodable, StatusCode};

/// The `ACK` message body: the server's revised buffer/message/chunk
/// limits. Per the Hello/Acknowledge negotiation rule, every field here
/// is `min(client's proposal, server's own limit)`, with `0` meaning "no
/// limit" for `max_message_size`/`max_chunk_count`.
#[derive(Debug, Clone)]
pub struct AcknowledgeMessage {
    pub protocol_version: u32,
    pub receive_buffer_size: u32,
    pub send_buffer_size: u32,
    pub max_message_size: u32,
    pub max_chunk_count: u32,
}

impl BinaryEncodable for AcknowledgeMessage {
    fn byte_len(&self) -> usize {
        20
    }

    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        let mut n = self.protocol_version.encode(stream)?;
        n += self.receive_buffer_size.encode(stream)?;
        n += self.send_buffer_size.encode(stream)?;
        n += self.max_message_size.encode(stream)?;
        n += self.max_chunk_count.encode(stream)?;
        Ok(n)
    }
}

impl BinaryDecodable for AcknowledgeMessage {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        Ok(Self {
            protocol_version: u32::decode(stream)?,
            receive_buffer_size: u32::decode(stream)?,
            send_buffer_size: u32::decode(stream)?,
            max_message_size: u32::decode(stream)?,
            max_chunk_count: u32::decode(stream)?,
        })
    }
}

/// The `ERR` message body sent just before a connection is dropped
/// during negotiation or on a fatal channel-level failure.
#[derive(Debug, Clone)]
pub struct ErrorMessage {
    pub error: StatusCode,
    pub reason: Option<String>,
}

impl BinaryEncodable for ErrorMessage {
    fn byte_len(&self) -> usize {
        4 + opcua_types::encoding::string_byte_len(&self.reason)
    }

    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        let mut n = self.error.as_u32().encode(stream)?;
        n += opcua_types::encoding::write_string(&self.reason, stream)?;
        Ok(n)
    }
}

#[derive(Debug, Clone)]
pub struct OpenSecureChannelResponse {
    pub server_protocol_version: u32,
    pub secure_channel_id: u32,
    pub token_id: u32,
    pub created_at: opcua_types::UaDateTime,
    pub revised_lifetime: u32,
    pub server_nonce: Vec<u8>,
}

impl BinaryEncodable for OpenSecureChannelResponse {
    fn byte_len(&self) -> usize {
        4 + 4 + 4 + self.created_at.byte_len() + 4 + opcua_types::encoding::bytes_byte_len(&Some(self.server_nonce.clone()))
    }

    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        let mut n = self.server_protocol_version.encode(stream)?;
        n += self.secure_channel_id.encode(stream)?;
        n += self.token_id.encode(stream)?;
        n += self.created_at.encode(stream)?;
        n += self.revised_lifetime.encode(stream)?;
        n += opcua_types::encoding::write_bytes(&Some(self.server_nonce.clone()), stream)?;
        Ok(n)
    }
}

impl BinaryDecodable for OpenSecureChannelResponse {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        Ok(Self {
            server_protocol_version: u32::decode(stream)?,
            secure_channel_id: u32::decode(stream)?,
            token_id: u32::decode(stream)?,
            created_at: opcua_types::UaDateTime::decode(stream)?,
            revised_lifetime: u32::decode(stream)?,
            server_nonce: opcua_types::encoding::read_bytes(stream)?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CloseSecureChannelResponse;

impl BinaryEncodable for CloseSecureChannelResponse {
    fn byte_len(&self) -> usize {
        0
    }
    fn encode<S: Write>(&self, _stream: &mut S) -> Result<usize, StatusCode> {
        Ok(0)
    }
}

impl BinaryDecodable for CloseSecureChannelResponse {
    fn decode<S: Read>(_stream: &mut S) -> Result<Self, StatusCode> {
        Ok(Self)
    }
}
