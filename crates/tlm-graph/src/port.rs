//! Port declarations and their node bindings.

use tlm_core::NodeId;

use crate::node::NodeType;

/// Causality of a component, or of a subsystem seen from its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cqs {
    /// Writes wave variable and characteristic impedance.
    C,
    /// Writes force/flow and velocity/pressure.
    Q,
    /// Signal only.
    S,
}

impl Cqs {
    pub fn as_str(self) -> &'static str {
        match self {
            Cqs::C => "C",
            Cqs::Q => "Q",
            Cqs::S => "S",
        }
    }
}

impl std::fmt::Display for Cqs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PortKind {
    Power,
    Read,
    Write,
    PowerMulti,
    ReadMulti,
    /// Boundary port of a component system.
    System,
}

impl PortKind {
    pub fn is_multi(self) -> bool {
        matches!(self, PortKind::PowerMulti | PortKind::ReadMulti)
    }

    pub fn is_power(self) -> bool {
        matches!(self, PortKind::Power | PortKind::PowerMulti)
    }

    pub fn is_read(self) -> bool {
        matches!(self, PortKind::Read | PortKind::ReadMulti)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PortKind::Power => "PowerPort",
            PortKind::Read => "ReadPort",
            PortKind::Write => "WritePort",
            PortKind::PowerMulti => "PowerMultiPort",
            PortKind::ReadMulti => "ReadMultiPort",
            PortKind::System => "SystemPort",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Requirement {
    #[default]
    Required,
    NotRequired,
}

/// Ordering role of a port when signal components are sorted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortHint {
    #[default]
    NotSet,
    Source,
    Destination,
    /// Reads a value without needing its writer to run first.
    IndependentDestination,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortDecl {
    pub name: String,
    /// `None` for a system port not yet connected to anything typed.
    pub node_type: Option<NodeType>,
    pub kind: PortKind,
    pub requirement: Requirement,
    pub sort_hint: SortHint,
    pub description: String,
}

impl PortDecl {
    fn new(name: &str, node_type: Option<NodeType>, kind: PortKind, requirement: Requirement) -> Self {
        let sort_hint = match kind {
            PortKind::Read | PortKind::ReadMulti => SortHint::Destination,
            PortKind::Write => SortHint::Source,
            _ => SortHint::NotSet,
        };
        Self {
            name: name.to_string(),
            node_type,
            kind,
            requirement,
            sort_hint,
            description: String::new(),
        }
    }

    pub fn power(name: &str, node_type: NodeType) -> Self {
        Self::new(name, Some(node_type), PortKind::Power, Requirement::Required)
    }

    pub fn power_multi(name: &str, node_type: NodeType) -> Self {
        Self::new(name, Some(node_type), PortKind::PowerMulti, Requirement::NotRequired)
    }

    pub fn read(name: &str, node_type: NodeType, requirement: Requirement) -> Self {
        Self::new(name, Some(node_type), PortKind::Read, requirement)
    }

    pub fn read_multi(name: &str, node_type: NodeType, requirement: Requirement) -> Self {
        Self::new(name, Some(node_type), PortKind::ReadMulti, requirement)
    }

    pub fn write(name: &str, node_type: NodeType, requirement: Requirement) -> Self {
        Self::new(name, Some(node_type), PortKind::Write, requirement)
    }

    pub fn system(name: &str) -> Self {
        Self::new(name, None, PortKind::System, Requirement::NotRequired)
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    pub fn with_sort_hint(mut self, hint: SortHint) -> Self {
        self.sort_hint = hint;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }
}

/// Physical node(s) a port is bound to for one run.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum PortBinding {
    #[default]
    Unconnected,
    Single(NodeId),
    /// One node per connected sub-port, in connection order.
    Multi(Vec<NodeId>),
}

impl PortBinding {
    pub fn is_connected(&self) -> bool {
        !self.nodes().is_empty()
    }

    pub fn nodes(&self) -> &[NodeId] {
        match self {
            PortBinding::Unconnected => &[],
            PortBinding::Single(node) => std::slice::from_ref(node),
            PortBinding::Multi(nodes) => nodes,
        }
    }

    /// Connected sub-port count; 1 for a connected single port.
    pub fn num_ports(&self) -> usize {
        self.nodes().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sort_hints_follow_direction() {
        assert_eq!(
            PortDecl::read("in", NodeType::Signal, Requirement::Required).sort_hint,
            SortHint::Destination
        );
        assert_eq!(
            PortDecl::write("out", NodeType::Signal, Requirement::NotRequired).sort_hint,
            SortHint::Source
        );
        assert_eq!(PortDecl::power("P1", NodeType::Mechanic).sort_hint, SortHint::NotSet);
        let delayed = PortDecl::read("in", NodeType::Signal, Requirement::Required)
            .with_sort_hint(SortHint::IndependentDestination);
        assert_eq!(delayed.sort_hint, SortHint::IndependentDestination);
    }

    #[test]
    fn binding_exposes_uniform_node_list() {
        let a = NodeId::from_index(0);
        let b = NodeId::from_index(1);
        assert_eq!(PortBinding::Unconnected.num_ports(), 0);
        assert_eq!(PortBinding::Single(a).nodes(), &[a]);
        let multi = PortBinding::Multi(vec![a, b]);
        assert_eq!(multi.num_ports(), 2);
        assert!(multi.is_connected());
        assert!(!PortBinding::Multi(vec![]).is_connected());
    }
}
