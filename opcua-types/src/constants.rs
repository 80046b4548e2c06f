//! Default values for the protocol and service limits. Mirrors the split
//! between the types crate's wire-level limits and the server crate's
//! operational limits: anything that bounds what can legally appear on
//! the wire lives here, anything that bounds server behavior lives in
//! `opcua-server::config`.

pub const MAX_STRING_LENGTH: usize = 65_536;
pub const MAX_BYTE_STRING_LENGTH: usize = 64 * 1024 * 1024;
pub const MAX_ARRAY_LENGTH: usize = 1_000_000;

pub const TCP_MESSAGE_HEADER_SIZE: usize = 8;
pub const SEQUENCE_HEADER_SIZE: usize = 8;

pub const DEFAULT_HELLO_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_SEND_BUFFER_SIZE: u32 = 65_536;
pub const DEFAULT_RECEIVE_BUFFER_SIZE: u32 = 65_536;
pub const DEFAULT_MAX_MESSAGE_SIZE: u32 = 64 * 1024 * 1024;
pub const DEFAULT_MAX_CHUNK_COUNT: u32 = 0;

/// The sequence number space wraps modulo 2^32, with exactly one legal
/// wrap point: after it passes this value the next number is 1 (0 is
/// never used as a sequence number).
pub const SEQUENCE_NUMBER_WRAP_THRESHOLD: u32 = 4_294_966_271;
pub const SEQUENCE_NUMBER_WRAP_LIMIT: u32 = 1024;

/// Overlap ratio for the previous secure channel token's derived keys,
/// expressed as a percentage of the token's nominal lifetime.
pub const TOKEN_OVERLAP_PERCENT: u32 = 125;
