use crate::basic::{ByteString, ExtensionObject, LocalizedText, QualifiedName, UaDateTime};
use crate::node_id::NodeId;

/// A tagged union over the scalar value kinds this server core needs to
/// carry through the data-change pipeline: enough to drive deadband
/// comparison and event attribute storage without reproducing the full
/// OPC UA built-in type table (that table lives in the address-space
/// facade, out of scope here).
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Empty,
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    DateTime(UaDateTime),
    ByteString(ByteString),
    NodeId(NodeId),
    LocalizedText(LocalizedText),
    QualifiedName(QualifiedName),
    StatusCode(crate::status_code::StatusCode),
    ExtensionObject(Box<ExtensionObject>),
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Empty
    }
}

impl Variant {
    /// Numeric coercion used by deadband comparison: every numeric
    /// variant reduces to `f64`, non-numeric variants have no numeric
    /// value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::Byte(v) => Some(*v as f64),
            Variant::SByte(v) => Some(*v as f64),
            Variant::Int16(v) => Some(*v as f64),
            Variant::UInt16(v) => Some(*v as f64),
            Variant::Int32(v) => Some(*v as f64),
            Variant::UInt32(v) => Some(*v as f64),
            Variant::Int64(v) => Some(*v as f64),
            Variant::UInt64(v) => Some(*v as f64),
            Variant::Float(v) => Some(*v as f64),
            Variant::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Empty => "Empty",
            Variant::Boolean(_) => "Boolean",
            Variant::Byte(_) => "Byte",
            Variant::SByte(_) => "SByte",
            Variant::Int16(_) => "Int16",
            Variant::UInt16(_) => "UInt16",
            Variant::Int32(_) => "Int32",
            Variant::UInt32(_) => "UInt32",
            Variant::Int64(_) => "Int64",
            Variant::UInt64(_) => "UInt64",
            Variant::Float(_) => "Float",
            Variant::Double(_) => "Double",
            Variant::String(_) => "String",
            Variant::DateTime(_) => "DateTime",
            Variant::ByteString(_) => "ByteString",
            Variant::NodeId(_) => "NodeId",
            Variant::LocalizedText(_) => "LocalizedText",
            Variant::QualifiedName(_) => "QualifiedName",
            Variant::StatusCode(_) => "StatusCode",
            Variant::ExtensionObject(_) => "ExtensionObject",
        }
    }
}
