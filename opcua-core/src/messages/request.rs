use std::io::{Read, Write};

use opcua_types::encoding::{read_string, write_string};
use opcua_types::{BinaryDecodable, BinaryEncodable, StatusCode};

/// The `HEL` message body: the client's proposed buffer sizes and the
/// endpoint URL it is dialing. Negotiation only ever shrinks these
/// values, never grows them — see [`super::response::AcknowledgeMessage`].
#[derive(Debug, Clone)]
pub struct HelloMessage {
    pub protocol_version: u32,
    pub receive_buffer_size: u32,
    pub send_buffer_size: u32,
    pub max_message_size: u32,
    pub max_chunk_count: u32,
    pub endpoint_url: Option<String>,
}

impl BinaryEncodable for HelloMessage {
    fn byte_len(&self) -> usize {
        20 + opcua_types::encoding::string_byte_len(&self.endpoint_url)
    }

    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        let mut n = self.protocol_version.encode(stream)?;
        n += self.receive_buffer_size.encode(stream)?;
        n += self.send_buffer_size.encode(stream)?;
        n += self.max_message_size.encode(stream)?;
        n += self.max_chunk_count.encode(stream)?;
        n += write_string(&self.endpoint_url, stream)?;
        Ok(n)
    }
}

impl BinaryDecodable for HelloMessage {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        Ok(Self {
            protocol_version: u32::decode(stream)?,
            receive_buffer_size: u32::decode(stream)?,
            send_buffer_size: u32::decode(stream)?,
            max_message_size: u32::decode(stream)?,
            max_chunk_count: u32::decode(stream)?,
            endpoint_url: read_string(stream)?,
        })
    }
}

/// The `OPN` request body. The asymmetric security header that precedes
/// it on the wire is handled separately by
/// [`crate::comms::security_header::AsymmetricSecurityHeader`]; this is
/// just the service payload.
#[derive(Debug, Clone)]
pub struct OpenSecureChannelRequest {
    pub client_protocol_version: u32,
    pub request_type: crate::comms::secure_channel::SecurityTokenRequestType,
    pub security_mode: opcua_types::MessageSecurityMode,
    pub client_nonce: Option<Vec<u8>>,
    pub requested_lifetime: u32,
}

fn security_mode_to_u32(mode: opcua_types::MessageSecurityMode) -> u32 {
    match mode {
        opcua_types::MessageSecurityMode::Invalid => 0,
        opcua_types::MessageSecurityMode::None => 1,
        opcua_types::MessageSecurityMode::Sign => 2,
        opcua_types::MessageSecurityMode::SignAndEncrypt => 3,
    }
}

fn security_mode_from_u32(v: u32) -> opcua_types::MessageSecurityMode {
    match v {
        1 => opcua_types::MessageSecurityMode::None,
        2 => opcua_types::MessageSecurityMode::Sign,
        3 => opcua_types::MessageSecurityMode::SignAndEncrypt,
        _ => opcua_types::MessageSecurityMode::Invalid,
    }
}

fn request_type_to_u32(t: crate::comms::secure_channel::SecurityTokenRequestType) -> u32 {
    match t {
        crate::comms::secure_channel::SecurityTokenRequestType::Issue => 0,
        crate::comms::secure_channel::SecurityTokenRequestType::Renew => 1,
    }
}

fn request_type_from_u32(v: u32) -> Result<crate::comms::secure_channel::SecurityTokenRequestType, StatusCode> {
    match v {
        0 => Ok(crate::comms::secure_channel::SecurityTokenRequestType::Issue),
        1 => Ok(crate::comms::secure_channel::SecurityTokenRequestType::Renew),
        _ => Err(StatusCode::BadDecodingError),
    }
}

impl BinaryEncodable for OpenSecureChannelRequest {
    fn byte_len(&self) -> usize {
        4 + 4 + 4 + opcua_types::encoding::bytes_byte_len(&self.client_nonce) + 4
    }

    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        let mut n = self.client_protocol_version.encode(stream)?;
        n += request_type_to_u32(self.request_type).encode(stream)?;
        n += security_mode_to_u32(self.security_mode).encode(stream)?;
        n += opcua_types::encoding::write_bytes(&self.client_nonce, stream)?;
        n += self.requested_lifetime.encode(stream)?;
        Ok(n)
    }
}

impl BinaryDecodable for OpenSecureChannelRequest {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        let client_protocol_version = u32::decode(stream)?;
        let request_type = request_type_from_u32(u32::decode(stream)?)?;
        let security_mode = security_mode_from_u32(u32::decode(stream)?);
        let client_nonce = opcua_types::encoding::read_bytes(stream)?;
        let requested_lifetime = u32::decode(stream)?;
        Ok(Self {
            client_protocol_version,
            request_type,
            security_mode,
            client_nonce,
            requested_lifetime,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CloseSecureChannelRequest {
    pub secure_channel_id: u32,
}

impl BinaryEncodable for CloseSecureChannelRequest {
    fn byte_len(&self) -> usize {
        4
    }
    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        self.secure_channel_id.encode(stream)
    }
}

impl BinaryDecodable for CloseSecureChannelRequest {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        Ok(Self {
            secure_channel_id: u32::decode(stream)?,
        })
    }
}
