//! Core data types and binary wire encoding for the OPC UA binary
//! transport: status codes, node identifiers, variants, and the service
//! request/response structures the server's connection pipeline and
//! subscription machinery operate on. Address-space node storage, the
//! generated built-in type table, and cryptographic primitives live
//! outside this crate.

pub mod basic;
pub mod constants;
pub mod data_value;
pub mod encoding;
pub mod error;
pub mod message;
pub mod node_id;
pub mod service_types;
pub mod status_code;
pub mod variant;

pub use basic::{ByteString, ExtensionObject, LocalizedText, QualifiedName, Range, UaDateTime};
pub use data_value::DataValue;
pub use encoding::{BinaryDecodable, BinaryEncodable};
pub use error::{Error, EncodingResult};
pub use message::{RequestMessage, ResponseMessage};
pub use node_id::{Identifier, NodeId};
pub use service_types::*;
pub use status_code::StatusCode;
pub use variant::Variant;
