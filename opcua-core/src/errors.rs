pub use opcua_types::error::{EncodingResult, Error};
pub use opcua_types::StatusCode;
