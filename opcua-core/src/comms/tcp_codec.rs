use bytes::{Buf, BufMut, BytesMut};
use opcua_types::StatusCode;
use tokio_util::codec::{Decoder, Encoder};

use super::message_chunk::{MessageChunk, MessageChunkHeader, MESSAGE_CHUNK_HEADER_SIZE};

/// Frames the raw TCP byte stream into [`MessageChunk`]s: reads the
/// 8-byte header to learn the total chunk size, then waits for that many
/// bytes before handing a whole chunk to the connection task. Oversized
/// chunks (beyond `max_chunk_size`) are rejected outright rather than
/// buffered, so a misbehaving peer can't be used to exhaust memory.
pub struct TcpCodec {
    max_chunk_size: usize,
}

impl TcpCodec {
    pub fn new(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }
}

impl Decoder for TcpCodec {
    type Item = MessageChunk;
    type Error = StatusCode;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < MESSAGE_CHUNK_HEADER_SIZE {
            return Ok(None);
        }
        let mut header_cursor = std::io::Cursor::new(&src[..MESSAGE_CHUNK_HEADER_SIZE]);
        let header = MessageChunkHeader::decode(&mut header_cursor)?;
        let message_size = header.message_size as usize;
        if message_size < MESSAGE_CHUNK_HEADER_SIZE || message_size > self.max_chunk_size {
            return Err(StatusCode::BadTcpMessageTooLarge);
        }
        if src.len() < message_size {
            src.reserve(message_size - src.len());
            return Ok(None);
        }
        let data = src[..message_size].to_vec();
        src.advance(message_size);
        Ok(Some(MessageChunk { header, data }))
    }
}

impl Encoder<MessageChunk> for TcpCodec {
    type Error = StatusCode;

    fn encode(&mut self, item: MessageChunk, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.data.len());
        dst.put_slice(&item.data);
        Ok(())
    }
}
