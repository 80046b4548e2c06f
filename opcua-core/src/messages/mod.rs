pub mod request;
pub mod response;

pub use request::{CloseSecureChannelRequest, HelloMessage, OpenSecureChannelRequest};
pub use response::{
    AcknowledgeMessage, CloseSecureChannelResponse, ErrorMessage, OpenSecureChannelResponse,
};

use opcua_types::{RequestMessage, ResponseMessage, StatusCode};

/// Binary encoding of the full OPC UA service type table (every
/// `CreateSessionRequest`, `PublishResponse`, etc. keyed by its numeric
/// `TypeId`) is generated from the standard's XML schema and is out of
/// scope for this crate. This trait is the seam the message dispatcher
/// calls through to turn a decoded `MSG` body into a
/// [`RequestMessage`]/[`ResponseMessage`] and back; a generated-types
/// crate (or, in tests, a hand-rolled stub) provides the implementation.
pub trait ServiceCodec: Send + Sync {
    fn decode_request(&self, body: &[u8]) -> Result<RequestMessage, StatusCode>;
    fn encode_response(&self, response: &ResponseMessage) -> Result<Vec<u8>, StatusCode>;
}
