//! tlm-graph: node and port data model.
//!
//! Provides:
//! - Node types with their slot description tables ([`NodeType`], [`NodeTypeRegistry`])
//! - Typed slot names per node type ([`MechanicSlot`], [`HydraulicSlot`], ...)
//! - One flat value arena for every node of a run, addressed by [`SlotRef`]
//! - Port declarations, bindings and the node-level connection rules
//! - A union-find used to merge nodes across system boundaries
//!
//! # Example
//!
//! ```
//! use tlm_graph::{MechanicSlot, NodeData, NodeType, NodeTypeRegistry};
//!
//! let registry = NodeTypeRegistry::new();
//! let mut data = NodeData::new();
//! let node = data.add_node(NodeType::Mechanic, registry.descriptions(NodeType::Mechanic));
//! let me = data.slot(node, MechanicSlot::EquivalentMass).unwrap();
//! assert_eq!(data[me], 1.0);
//! ```

pub mod data;
pub mod disjoint;
pub mod error;
pub mod node;
pub mod port;
pub mod rules;

pub use data::{NodeData, ReadRef, SlotRef};
pub use disjoint::DisjointSet;
pub use error::{GraphError, GraphResult};
pub use node::{
    DataDescription, ElectricSlot, HydraulicSlot, MechanicSlot, NodeSlot, NodeType,
    NodeTypeInfo, NodeTypeRegistry, RawSlot, RotationalSlot, SignalSlot, VariableCategory,
};
pub use port::{Cqs, PortBinding, PortDecl, PortKind, Requirement, SortHint};
pub use rules::{NodeCheck, Terminal, check_node, check_pair};
