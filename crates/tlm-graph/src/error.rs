//! Graph-specific error types.

use tlm_core::NodeId;

pub type GraphResult<T> = Result<T, GraphError>;

/// Node, port and connection errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Two terminals of one node declare different node types.
    NodeTypeMismatch { a: String, b: String },

    /// A port was connected to itself.
    SelfConnection { port: String },

    /// The two ports are already directly connected.
    AlreadyConnected { a: String, b: String },

    MultiportToMultiport { a: String, b: String },

    ReadToMultiport { a: String, b: String },

    /// More than two power ports ended up on one node.
    TooManyPowerPorts { count: usize },

    /// More than one write port on one signal node.
    MultipleWriters { count: usize },

    /// A write port and a power port share a node.
    WriterOnPowerNode,

    /// Two C-type (or two Q-type) power ports share a node.
    CausalityConflict { cqs: crate::Cqs, a: String, b: String },

    /// A power node with only one power port attached.
    DanglingPowerPort { port: String },

    /// A complete power node without one C side and one Q side.
    IncompleteCausality { a: String, b: String },

    UnknownNodeType { name: String },

    UnknownSlot { node_type: String, slot: String },

    DuplicateNodeType { name: String },

    /// Node types can no longer be registered.
    RegistrySealed,

    /// Node id does not exist in the arena.
    InvalidNode { node: NodeId },

    /// Slot index outside the node's description table.
    SlotOob { node: NodeId, index: usize, len: usize },

    /// A slot of one node type was requested from a node of another type.
    SlotTypeMismatch { expected: String, actual: String },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::NodeTypeMismatch { a, b } => {
                write!(f, "Node type mismatch: {} vs {}", a, b)
            }
            GraphError::SelfConnection { port } => {
                write!(f, "Cannot connect port {} to itself", port)
            }
            GraphError::AlreadyConnected { a, b } => {
                write!(f, "Ports {} and {} are already connected", a, b)
            }
            GraphError::MultiportToMultiport { a, b } => {
                write!(f, "Cannot connect multiport {} to multiport {}", a, b)
            }
            GraphError::ReadToMultiport { a, b } => {
                write!(f, "Cannot connect read port to multiport ({} - {})", a, b)
            }
            GraphError::TooManyPowerPorts { count } => {
                write!(f, "Node would have {} power ports (at most 2)", count)
            }
            GraphError::MultipleWriters { count } => {
                write!(f, "Node would have {} write ports (at most 1)", count)
            }
            GraphError::WriterOnPowerNode => {
                write!(f, "Cannot connect a write port to a node with power ports")
            }
            GraphError::CausalityConflict { cqs, a, b } => {
                write!(
                    f,
                    "Cannot connect two {}-type power ports ({} - {}); this forms an algebraic loop",
                    cqs, a, b
                )
            }
            GraphError::DanglingPowerPort { port } => {
                write!(f, "Power port {} is connected to a node with only one power port", port)
            }
            GraphError::IncompleteCausality { a, b } => {
                write!(f, "Power node between {} and {} needs one C side and one Q side", a, b)
            }
            GraphError::UnknownNodeType { name } => write!(f, "Unknown node type: {}", name),
            GraphError::UnknownSlot { node_type, slot } => {
                write!(f, "Node type {} has no slot named {}", node_type, slot)
            }
            GraphError::DuplicateNodeType { name } => {
                write!(f, "Node type {} is already registered", name)
            }
            GraphError::RegistrySealed => {
                write!(f, "Node type registry is sealed; register libraries before loading models")
            }
            GraphError::InvalidNode { node } => write!(f, "Node {} does not exist", node),
            GraphError::SlotOob { node, index, len } => {
                write!(f, "Slot {} out of range for node {} ({} slots)", index, node, len)
            }
            GraphError::SlotTypeMismatch { expected, actual } => {
                write!(f, "Slot belongs to {} but node is {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for GraphError {}
