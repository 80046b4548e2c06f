use std::fmt;

use crate::status_code::StatusCode;

/// Pairs a [`StatusCode`] with a human-readable context message. This is
/// the error type used anywhere a caller needs to know *why* an operation
/// failed and not only its status, while [`StatusCode`] alone remains the
/// currency of the wire protocol and of per-element service results.
#[derive(Debug, Clone)]
pub struct Error {
    pub status: StatusCode,
    pub message: String,
}

impl Error {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for Error {}

impl From<Error> for StatusCode {
    fn from(e: Error) -> Self {
        e.status
    }
}

impl From<StatusCode> for Error {
    fn from(status: StatusCode) -> Self {
        Error {
            status,
            message: String::new(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind::*;
        let status = match e.kind() {
            UnexpectedEof => StatusCode::BadDecodingError,
            TimedOut => StatusCode::BadTimeout,
            ConnectionReset | ConnectionAborted | BrokenPipe => StatusCode::BadConnectionClosed,
            _ => StatusCode::BadTcpInternalError,
        };
        Error::new(status, e.to_string())
    }
}

pub type EncodingResult<T> = Result<T, StatusCode>;
