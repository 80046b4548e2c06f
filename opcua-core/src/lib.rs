//! Binary transport framing, secure channel state, and the handful of
//! connection-level wire messages (Hello/Acknowledge/Error,
//! OpenSecureChannel/CloseSecureChannel) that make up the OPC UA
//! `opc.tcp` protocol below the service layer.

pub mod comms;
pub mod config;
pub mod errors;
pub mod handle;
pub mod messages;
pub mod sync;

pub use config::{Config, ConfigError};
pub use errors::{EncodingResult, Error, StatusCode};
pub use handle::AtomicHandle;
pub use messages::ServiceCodec;
