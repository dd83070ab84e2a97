//! Rules for which ports may share a node.
//!
//! Assembly checks each connection against the node it would create
//! ([`NodeCheck::Partial`]). Initialization rechecks every node of the
//! flattened network, where a power node must also be complete
//! ([`NodeCheck::Complete`]).

use crate::error::{GraphError, GraphResult};
use crate::node::NodeType;
use crate::port::{Cqs, PortKind};

/// One port, or one sub-port of a multi-port, attached to a node.
#[derive(Clone, Debug, PartialEq)]
pub struct Terminal {
    /// `component.port`, used in messages.
    pub label: String,
    /// Effective kind. Boundary ports that only pass a node through keep
    /// [`PortKind::System`] and are ignored by the counting rules.
    pub kind: PortKind,
    pub node_type: Option<NodeType>,
    /// Causality of the owner for power terminals, when known.
    pub cqs: Option<Cqs>,
}

impl Terminal {
    pub fn new(label: impl Into<String>, kind: PortKind, node_type: Option<NodeType>) -> Self {
        Self {
            label: label.into(),
            kind,
            node_type,
            cqs: None,
        }
    }

    pub fn with_cqs(mut self, cqs: Cqs) -> Self {
        self.cqs = Some(cqs);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeCheck {
    Partial,
    Complete,
}

/// Rules that only depend on the two ports being joined.
pub fn check_pair(a: &Terminal, b: &Terminal) -> GraphResult<()> {
    if a.label == b.label {
        return Err(GraphError::SelfConnection {
            port: a.label.clone(),
        });
    }
    if a.kind.is_multi() && b.kind.is_multi() {
        return Err(GraphError::MultiportToMultiport {
            a: a.label.clone(),
            b: b.label.clone(),
        });
    }
    if (a.kind == PortKind::Read && b.kind.is_multi())
        || (b.kind == PortKind::Read && a.kind.is_multi())
    {
        return Err(GraphError::ReadToMultiport {
            a: a.label.clone(),
            b: b.label.clone(),
        });
    }
    Ok(())
}

/// Validate the terminals sharing one node and return its node type
/// (`None` when every terminal is an untyped boundary port).
pub fn check_node(terminals: &[Terminal], mode: NodeCheck) -> GraphResult<Option<NodeType>> {
    let mut node_type: Option<(NodeType, &str)> = None;
    for t in terminals {
        if let Some(nt) = t.node_type {
            match node_type {
                None => node_type = Some((nt, &t.label)),
                Some((prev, prev_label)) if prev != nt => {
                    return Err(GraphError::NodeTypeMismatch {
                        a: format!("{} ({})", prev_label, prev),
                        b: format!("{} ({})", t.label, nt),
                    });
                }
                Some(_) => {}
            }
        }
    }

    let power: Vec<&Terminal> = terminals.iter().filter(|t| t.kind.is_power()).collect();
    if power.len() > 2 {
        return Err(GraphError::TooManyPowerPorts { count: power.len() });
    }
    let writers = terminals.iter().filter(|t| t.kind == PortKind::Write).count();
    if writers > 1 {
        return Err(GraphError::MultipleWriters { count: writers });
    }
    if writers > 0 && !power.is_empty() {
        return Err(GraphError::WriterOnPowerNode);
    }
    for cqs in [Cqs::C, Cqs::Q] {
        let same: Vec<&&Terminal> = power.iter().filter(|t| t.cqs == Some(cqs)).collect();
        if same.len() > 1 {
            return Err(GraphError::CausalityConflict {
                cqs,
                a: same[0].label.clone(),
                b: same[1].label.clone(),
            });
        }
    }

    if mode == NodeCheck::Complete {
        match power.as_slice() {
            [single] => {
                return Err(GraphError::DanglingPowerPort {
                    port: single.label.clone(),
                });
            }
            [a, b] => {
                let pair = (a.cqs, b.cqs);
                let complete = matches!(
                    pair,
                    (Some(Cqs::C), Some(Cqs::Q)) | (Some(Cqs::Q), Some(Cqs::C))
                );
                if !complete {
                    return Err(GraphError::IncompleteCausality {
                        a: a.label.clone(),
                        b: b.label.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(node_type.map(|(nt, _)| nt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power(label: &str, cqs: Cqs) -> Terminal {
        Terminal::new(label, PortKind::Power, Some(NodeType::Mechanic)).with_cqs(cqs)
    }

    fn signal(label: &str, kind: PortKind) -> Terminal {
        Terminal::new(label, kind, Some(NodeType::Signal))
    }

    #[test]
    fn c_to_q_is_complete() {
        let nodes = [power("spring.P1", Cqs::C), power("mass.P1", Cqs::Q)];
        assert_eq!(
            check_node(&nodes, NodeCheck::Complete).unwrap(),
            Some(NodeType::Mechanic)
        );
    }

    #[test]
    fn same_causality_is_an_algebraic_loop() {
        let nodes = [power("m1.P2", Cqs::Q), power("m2.P1", Cqs::Q)];
        assert!(matches!(
            check_node(&nodes, NodeCheck::Partial),
            Err(GraphError::CausalityConflict { cqs: Cqs::Q, .. })
        ));
    }

    #[test]
    fn node_type_mismatch_names_both_ports() {
        let nodes = [
            power("mass.P1", Cqs::Q),
            Terminal::new("orifice.P1", PortKind::Power, Some(NodeType::Hydraulic)),
        ];
        let err = check_node(&nodes, NodeCheck::Partial).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("mass.P1") && text.contains("orifice.P1"));
    }

    #[test]
    fn blank_system_port_adopts_type() {
        let nodes = [
            Terminal::new("sub.in", PortKind::System, None),
            signal("gain.out", PortKind::Write),
        ];
        assert_eq!(
            check_node(&nodes, NodeCheck::Partial).unwrap(),
            Some(NodeType::Signal)
        );
        let blank = [Terminal::new("sub.in", PortKind::System, None)];
        assert_eq!(check_node(&blank, NodeCheck::Partial).unwrap(), None);
    }

    #[test]
    fn writer_rules() {
        let two_writers = [signal("a.out", PortKind::Write), signal("b.out", PortKind::Write)];
        assert!(matches!(
            check_node(&two_writers, NodeCheck::Partial),
            Err(GraphError::MultipleWriters { count: 2 })
        ));
        let mixed = [
            power("mass.P1", Cqs::Q),
            Terminal::new("src.out", PortKind::Write, Some(NodeType::Mechanic)),
        ];
        assert_eq!(
            check_node(&mixed, NodeCheck::Partial),
            Err(GraphError::WriterOnPowerNode)
        );
    }

    #[test]
    fn power_count_rules() {
        let three = [
            power("a.P", Cqs::C),
            power("b.P", Cqs::Q),
            Terminal::new("c.P", PortKind::Power, Some(NodeType::Mechanic)),
        ];
        assert!(matches!(
            check_node(&three, NodeCheck::Partial),
            Err(GraphError::TooManyPowerPorts { count: 3 })
        ));
        let one = [
            power("a.P", Cqs::C),
            Terminal::new("sensor.P1", PortKind::Read, Some(NodeType::Mechanic)),
        ];
        assert!(check_node(&one, NodeCheck::Partial).is_ok());
        assert!(matches!(
            check_node(&one, NodeCheck::Complete),
            Err(GraphError::DanglingPowerPort { .. })
        ));
    }

    #[test]
    fn pair_rules() {
        let multi = Terminal::new("max.in", PortKind::ReadMulti, Some(NodeType::Signal));
        let other_multi = Terminal::new("sum.in", PortKind::ReadMulti, Some(NodeType::Signal));
        let read = signal("gain.in", PortKind::Read);
        let write = signal("src.out", PortKind::Write);
        assert!(check_pair(&multi, &write).is_ok());
        assert!(matches!(
            check_pair(&multi, &other_multi),
            Err(GraphError::MultiportToMultiport { .. })
        ));
        assert!(matches!(
            check_pair(&read, &multi),
            Err(GraphError::ReadToMultiport { .. })
        ));
        assert!(matches!(
            check_pair(&read, &read.clone()),
            Err(GraphError::SelfConnection { .. })
        ));
    }
}
