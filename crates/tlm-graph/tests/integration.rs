//! Integration tests for tlm-graph.

use tlm_graph::*;

/// Terminals merged through a union-find end up on one arena node, so every
/// slot handle they resolve is identical.
#[test]
fn merged_terminals_share_every_slot() {
    let registry = NodeTypeRegistry::new();

    // spring.P2 -- sub.P (boundary) -- mass.P1, plus an unrelated signal pair
    let mut set = DisjointSet::new(5);
    set.union(0, 1);
    set.union(1, 2);
    set.union(3, 4);

    let mut data = NodeData::new();
    let mut node_of = vec![None; 5];
    for group in set.groups() {
        let node_type = if group.contains(&0) {
            NodeType::Mechanic
        } else {
            NodeType::Signal
        };
        let node = data.add_node(node_type, registry.descriptions(node_type));
        for terminal in group {
            node_of[terminal] = Some(node);
        }
    }

    let spring = node_of[0].unwrap();
    let mass = node_of[2].unwrap();
    for slot in MechanicSlot::ALL {
        assert_eq!(
            data.slot(spring, *slot).unwrap(),
            data.slot(mass, *slot).unwrap()
        );
    }
    assert_ne!(node_of[0], node_of[3]);

    let c = data.slot(spring, MechanicSlot::WaveVariable).unwrap();
    data[c] = 42.0;
    let seen_by_mass = data.slot(mass, MechanicSlot::WaveVariable).unwrap();
    assert_eq!(data.get(seen_by_mass), 42.0);
}

#[test]
fn custom_node_type_gets_arena_storage() {
    let mut registry = NodeTypeRegistry::new();
    let thermal = registry
        .register_custom(
            "NodeThermal",
            vec![
                DataDescription::new("Temperature", "T", "K", VariableCategory::Intensity, 300.0),
                DataDescription::new("HeatFlow", "Q", "W", VariableCategory::Flow, 0.0),
            ],
        )
        .unwrap();
    registry.seal();

    let mut data = NodeData::new();
    let node = data.add_node(thermal, registry.descriptions(thermal));
    let t = data
        .slot(
            node,
            RawSlot {
                node_type: thermal,
                index: registry.slot_index(thermal, "T").unwrap(),
            },
        )
        .unwrap();
    assert_eq!(data[t], 300.0);
    assert_eq!(data.node_type(node), Some(thermal));
}

#[test]
fn partial_then_complete_node_checks() {
    let c = Terminal::new("spring.P1", PortKind::Power, Some(NodeType::Mechanic)).with_cqs(Cqs::C);
    let q = Terminal::new("mass.P2", PortKind::Power, Some(NodeType::Mechanic)).with_cqs(Cqs::Q);
    let sensor = Terminal::new("xsens.P1", PortKind::Read, Some(NodeType::Mechanic));

    assert!(check_node(&[c.clone(), sensor.clone()], NodeCheck::Partial).is_ok());
    assert!(check_node(&[c.clone(), sensor.clone()], NodeCheck::Complete).is_err());
    assert!(check_node(&[c, q, sensor], NodeCheck::Complete).is_ok());
}
