use std::io::{Read, Write};

use opcua_types::encoding::{read_bytes, read_string, write_bytes, write_string};
use opcua_types::{BinaryDecodable, BinaryEncodable, StatusCode};

/// Precedes the sequence header on OPN chunks: carries the security
/// policy URI and the sender/receiver certificate thumbprints used to
/// pick the right key material before a symmetric token even exists.
#[derive(Debug, Clone, Default)]
pub struct AsymmetricSecurityHeader {
    pub security_policy_uri: Option<String>,
    pub sender_certificate: Option<Vec<u8>>,
    pub receiver_certificate_thumbprint: Option<Vec<u8>>,
}

impl BinaryEncodable for AsymmetricSecurityHeader {
    fn byte_len(&self) -> usize {
        opcua_types::encoding::string_byte_len(&self.security_policy_uri)
            + opcua_types::encoding::bytes_byte_len(&self.sender_certificate)
            + opcua_types::encoding::bytes_byte_len(&self.receiver_certificate_thumbprint)
    }

    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        let mut n = write_string(&self.security_policy_uri, stream)?;
        n += write_bytes(&self.sender_certificate, stream)?;
        n += write_bytes(&self.receiver_certificate_thumbprint, stream)?;
        Ok(n)
    }
}

impl BinaryDecodable for AsymmetricSecurityHeader {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        Ok(Self {
            security_policy_uri: read_string(stream)?,
            sender_certificate: read_bytes(stream)?,
            receiver_certificate_thumbprint: read_bytes(stream)?,
        })
    }
}

/// Precedes the sequence header on all other chunks once a channel is
/// open: just the token id selecting which derived key set (current or
/// previous) to use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymmetricSecurityHeader {
    pub token_id: u32,
}

impl BinaryEncodable for SymmetricSecurityHeader {
    fn byte_len(&self) -> usize {
        4
    }
    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        self.token_id.encode(stream)
    }
}

impl BinaryDecodable for SymmetricSecurityHeader {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        Ok(Self {
            token_id: u32::decode(stream)?,
        })
    }
}

/// Sequence header: monotonic sequence number plus the request id it
/// answers, present on every chunk after the security header.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceHeader {
    pub sequence_number: u32,
    pub request_id: u32,
}

impl BinaryEncodable for SequenceHeader {
    fn byte_len(&self) -> usize {
        8
    }
    fn encode<S: Write>(&self, stream: &mut S) -> Result<usize, StatusCode> {
        let mut n = self.sequence_number.encode(stream)?;
        n += self.request_id.encode(stream)?;
        Ok(n)
    }
}

impl BinaryDecodable for SequenceHeader {
    fn decode<S: Read>(stream: &mut S) -> Result<Self, StatusCode> {
        Ok(Self {
            sequence_number: u32::decode(stream)?,
            request_id: u32::decode(stream)?,
        })
    }
}
