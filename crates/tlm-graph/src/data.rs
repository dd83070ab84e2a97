//! Flat storage for the values of every node in a run.
//!
//! Components resolve their slots to [`SlotRef`] handles once, during
//! initialization, and index the arena with them every step. Two ports bound
//! to the same node receive the same handle.

use std::ops::{Index, IndexMut};

use tlm_core::NodeId;

use crate::error::{GraphError, GraphResult};
use crate::node::{DataDescription, NodeSlot, NodeType};

/// Read/write handle to one `f64` in a [`NodeData`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotRef(u32);

impl SlotRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn read_only(self) -> ReadRef {
        ReadRef(self)
    }
}

/// Read-only handle. Read ports only ever hand these out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadRef(SlotRef);

impl ReadRef {
    pub fn index(self) -> usize {
        self.0.index()
    }
}

impl From<SlotRef> for ReadRef {
    fn from(slot: SlotRef) -> Self {
        ReadRef(slot)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct NodeRecord {
    node_type: NodeType,
    offset: u32,
    len: u32,
}

#[derive(Clone, Debug, Default)]
pub struct NodeData {
    values: Vec<f64>,
    nodes: Vec<NodeRecord>,
}

impl NodeData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node whose slots start at their description defaults.
    pub fn add_node(&mut self, node_type: NodeType, descriptions: &[DataDescription]) -> NodeId {
        let offset = self.values.len() as u32;
        self.values.extend(descriptions.iter().map(|d| d.default));
        let id = NodeId::from_index(self.nodes.len() as u32);
        self.nodes.push(NodeRecord {
            node_type,
            offset,
            len: descriptions.len() as u32,
        });
        id
    }

    /// Storage owned by one component for an unconnected optional port.
    pub fn add_scratch(&mut self, value: f64) -> SlotRef {
        let slot = SlotRef(self.values.len() as u32);
        self.values.push(value);
        slot
    }

    fn record(&self, node: NodeId) -> GraphResult<NodeRecord> {
        self.nodes
            .get(node.as_usize())
            .copied()
            .ok_or(GraphError::InvalidNode { node })
    }

    pub fn node_type(&self, node: NodeId) -> Option<NodeType> {
        self.nodes.get(node.as_usize()).map(|r| r.node_type)
    }

    /// Handle to a typed slot; the slot's node type must match the node's.
    pub fn slot<S: NodeSlot>(&self, node: NodeId, slot: S) -> GraphResult<SlotRef> {
        let record = self.record(node)?;
        if record.node_type != slot.node_type() {
            return Err(GraphError::SlotTypeMismatch {
                expected: slot.node_type().to_string(),
                actual: record.node_type.to_string(),
            });
        }
        self.slot_at(node, slot.index())
    }

    /// Handle to a slot by position.
    pub fn slot_at(&self, node: NodeId, index: usize) -> GraphResult<SlotRef> {
        let record = self.record(node)?;
        if index >= record.len as usize {
            return Err(GraphError::SlotOob {
                node,
                index,
                len: record.len as usize,
            });
        }
        Ok(SlotRef(record.offset + index as u32))
    }

    pub fn node_values(&self, node: NodeId) -> &[f64] {
        match self.nodes.get(node.as_usize()) {
            Some(r) => &self.values[r.offset as usize..(r.offset + r.len) as usize],
            None => &[],
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of stored values, scratch cells included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, slot: impl Into<ReadRef>) -> f64 {
        self.values[slot.into().index()]
    }

    #[inline]
    pub fn set(&mut self, slot: SlotRef, value: f64) {
        self.values[slot.index()] = value;
    }

    /// Every stored value, indexable with [`SlotRef::index`].
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl Index<SlotRef> for NodeData {
    type Output = f64;

    #[inline]
    fn index(&self, slot: SlotRef) -> &f64 {
        &self.values[slot.index()]
    }
}

impl IndexMut<SlotRef> for NodeData {
    #[inline]
    fn index_mut(&mut self, slot: SlotRef) -> &mut f64 {
        &mut self.values[slot.index()]
    }
}

impl Index<ReadRef> for NodeData {
    type Output = f64;

    #[inline]
    fn index(&self, slot: ReadRef) -> &f64 {
        &self.values[slot.index()]
    }
}
