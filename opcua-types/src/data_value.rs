use crate::basic::UaDateTime;
use crate::status_code::StatusCode;
use crate::variant::Variant;

/// The value/status/timestamp triple attached to every read result and
/// data-change notification. `source_timestamp` is when the value was
/// produced, `server_timestamp` when the server observed it; monitored
/// items sample and filter on this whole structure, not the bare value.
#[derive(Debug, Clone)]
pub struct DataValue {
    pub value: Option<Variant>,
    pub status: Option<StatusCode>,
    pub source_timestamp: Option<UaDateTime>,
    pub source_picoseconds: Option<u16>,
    pub server_timestamp: Option<UaDateTime>,
    pub server_picoseconds: Option<u16>,
    /// The wire `InfoBits.Overflow` bit OPC UA folds into the status
    /// code's low byte. Kept as its own field rather than packed into
    /// `status` since `StatusCode` here is a closed enum of named
    /// results, not the raw 32-bit code the bit actually lives in.
    pub overflow: bool,
}

impl Default for DataValue {
    fn default() -> Self {
        Self {
            value: None,
            status: None,
            source_timestamp: None,
            source_picoseconds: None,
            server_timestamp: None,
            server_picoseconds: None,
            overflow: false,
        }
    }
}

impl DataValue {
    pub fn new_now(value: Variant, now: UaDateTime) -> Self {
        Self {
            value: Some(value),
            status: Some(StatusCode::Good),
            source_timestamp: Some(now),
            source_picoseconds: None,
            server_timestamp: Some(now),
            server_picoseconds: None,
            overflow: false,
        }
    }

    pub fn is_good(&self) -> bool {
        self.status.map(|s| s.is_good()).unwrap_or(true)
    }
}
