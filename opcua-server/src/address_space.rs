//! The boundary between the subscription/monitored-item machinery and
//! whatever owns node storage. Node lookup, value storage, and the
//! attribute model itself are out of scope here; this trait only names
//! the handful of operations the sampler and the `Read`/`Write`/`Browse`
//! services need to call through.

use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::RwLock;

use opcua_types::basic::Range;
use opcua_types::data_value::DataValue;
use opcua_types::node_id::NodeId;
use opcua_types::service_types::{BrowseDescription, ReferenceDescription};
use opcua_types::StatusCode;

#[async_trait]
pub trait AddressSpace: Send + Sync {
    async fn read(
        &self,
        node_id: &NodeId,
        attribute_id: u32,
        index_range: Option<&str>,
    ) -> DataValue;

    async fn write(
        &self,
        node_id: &NodeId,
        attribute_id: u32,
        index_range: Option<&str>,
        value: DataValue,
    ) -> StatusCode;

    /// The `EURange` property used to resolve percent-deadband filters.
    /// `None` means the node carries no such property, which the caller
    /// must treat as a fallback to an absolute deadband of 0.
    async fn eu_range(&self, node_id: &NodeId) -> Option<Range>;

    async fn browse(
        &self,
        description: &BrowseDescription,
    ) -> Result<Vec<ReferenceDescription>, StatusCode>;
}

/// A bare in-memory address space, useful for tests and as a reference
/// implementation of the trait above. Values are keyed by (node, attribute);
/// nothing here models node classes, references, or type hierarchies.
#[derive(Default)]
pub struct InMemoryAddressSpace {
    values: RwLock<HashMap<(NodeId, u32), DataValue>>,
    eu_ranges: RwLock<HashMap<NodeId, Range>>,
}

impl InMemoryAddressSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&self, node_id: NodeId, attribute_id: u32, value: DataValue) {
        self.values.write().insert((node_id, attribute_id), value);
    }

    pub fn set_eu_range(&self, node_id: NodeId, range: Range) {
        self.eu_ranges.write().insert(node_id, range);
    }
}

#[async_trait]
impl AddressSpace for InMemoryAddressSpace {
    async fn read(
        &self,
        node_id: &NodeId,
        attribute_id: u32,
        _index_range: Option<&str>,
    ) -> DataValue {
        self.values
            .read()
            .get(&(node_id.clone(), attribute_id))
            .cloned()
            .unwrap_or_else(|| DataValue {
                status: Some(StatusCode::BadNodeIdUnknown),
                ..Default::default()
            })
    }

    async fn write(
        &self,
        node_id: &NodeId,
        attribute_id: u32,
        _index_range: Option<&str>,
        value: DataValue,
    ) -> StatusCode {
        self.values
            .write()
            .insert((node_id.clone(), attribute_id), value);
        StatusCode::Good
    }

    async fn eu_range(&self, node_id: &NodeId) -> Option<Range> {
        self.eu_ranges.read().get(node_id).copied()
    }

    async fn browse(
        &self,
        _description: &BrowseDescription,
    ) -> Result<Vec<ReferenceDescription>, StatusCode> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcua_types::variant::Variant;

    #[tokio::test]
    async fn unknown_node_reads_as_bad_node_id_unknown() {
        let space = InMemoryAddressSpace::new();
        let value = space.read(&NodeId::new(1, 1u32), 13, None).await;
        assert_eq!(value.status, Some(StatusCode::BadNodeIdUnknown));
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let space = InMemoryAddressSpace::new();
        let node = NodeId::new(1, 1u32);
        let dv = DataValue {
            value: Some(Variant::Int32(42)),
            status: Some(StatusCode::Good),
            ..Default::default()
        };
        space.write(&node, 13, None, dv).await;
        let back = space.read(&node, 13, None).await;
        assert_eq!(back.value, Some(Variant::Int32(42)));
    }
}
