use std::collections::HashMap;

use opcua_types::StatusCode;

use super::message_chunk::{MessageChunk, MessageChunkType, MessageIsFinalType};

/// Splits an encoded message body into one or more chunks no larger than
/// `max_chunk_size`, tagging all but the last as intermediate (`C`) and
/// the last as final (`F`). A body that already fits in one chunk
/// produces exactly one `F` chunk.
pub fn chunk(
    message_type: MessageChunkType,
    body: &[u8],
    max_chunk_size: usize,
) -> Result<Vec<MessageChunk>, StatusCode> {
    if body.is_empty() {
        return Ok(vec![MessageChunk::new(message_type, MessageIsFinalType::Final, body)?]);
    }
    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < body.len() {
        let end = (offset + max_chunk_size).min(body.len());
        let is_final = if end == body.len() {
            MessageIsFinalType::Final
        } else {
            MessageIsFinalType::Intermediate
        };
        chunks.push(MessageChunk::new(message_type, is_final, &body[offset..end])?);
        offset = end;
    }
    Ok(chunks)
}

/// Reassembles chunks belonging to a single (channel, request id) pair
/// into the complete message body once the final chunk arrives. An `A`
/// (abort) chunk discards everything accumulated so far for that key and
/// reports `BadRequestInterrupted` to the caller, matching the framing
/// rule that an aborted multi-chunk message must never be partially
/// delivered to the dispatcher.
#[derive(Default)]
pub struct Reassembler {
    pending: HashMap<(u32, u32), Vec<u8>>,
}

pub enum ReassembleOutcome {
    Incomplete,
    Complete(Vec<u8>),
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(
        &mut self,
        key: (u32, u32),
        is_final: MessageIsFinalType,
        body: &[u8],
    ) -> Result<ReassembleOutcome, StatusCode> {
        match is_final {
            MessageIsFinalType::Abort => {
                self.pending.remove(&key);
                Err(StatusCode::BadRequestInterrupted)
            }
            MessageIsFinalType::Intermediate => {
                self.pending.entry(key).or_default().extend_from_slice(body);
                Ok(ReassembleOutcome::Incomplete)
            }
            MessageIsFinalType::Final => {
                let mut buf = self.pending.remove(&key).unwrap_or_default();
                buf.extend_from_slice(body);
                Ok(ReassembleOutcome::Complete(buf))
            }
        }
    }

    pub fn abandon(&mut self, key: (u32, u32)) {
        self.pending.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_for_small_body() {
        let chunks = chunk(MessageChunkType::Message, b"hello", 1024).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].header.is_final, MessageIsFinalType::Final);
    }

    #[test]
    fn splits_body_across_chunks_and_reassembles() {
        let body = vec![7u8; 100];
        let chunks = chunk(MessageChunkType::Message, &body, 30).unwrap();
        assert!(chunks.len() > 1);

        let mut reassembler = Reassembler::new();
        let key = (1, 1);
        let mut result = None;
        for c in &chunks {
            match reassembler.accept(key, c.header.is_final, c.body()).unwrap() {
                ReassembleOutcome::Incomplete => {}
                ReassembleOutcome::Complete(buf) => result = Some(buf),
            }
        }
        assert_eq!(result.unwrap(), body);
    }

    #[test]
    fn abort_chunk_discards_pending_data() {
        let mut reassembler = Reassembler::new();
        let key = (1, 2);
        reassembler
            .accept(key, MessageIsFinalType::Intermediate, b"partial")
            .unwrap();
        let err = reassembler
            .accept(key, MessageIsFinalType::Abort, b"")
            .unwrap_err();
        assert_eq!(err, StatusCode::BadRequestInterrupted);
    }
}
