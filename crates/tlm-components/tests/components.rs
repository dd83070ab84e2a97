//! Behaviour of library components driven through the standalone harness.

use proptest::prelude::*;
use tlm_components::harness::Harness;
use tlm_components::mechanic::{TranslationalMass, TranslationalSpring};
use tlm_components::{ComponentError, ComponentFactory, LIBRARY};
use tlm_graph::{MechanicSlot, NodeTypeRegistry, SignalSlot};

fn spring(k: f64, dt: f64) -> Harness {
    let mut h = Harness::of::<TranslationalSpring>(dt).unwrap();
    h.set_parameter("k", k).unwrap();
    h.connect("P1").unwrap();
    h.connect("P2").unwrap();
    h.initialize().unwrap();
    h
}

proptest! {
    #[test]
    fn spring_round_trip_law(
        k in 1.0f64..1e6,
        velocities in prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 1..50),
    ) {
        let dt = 1e-3;
        let mut h = spring(k, dt);
        let zc = k * dt;
        for (v1, v2) in velocities {
            h.set("P1", MechanicSlot::Velocity, v1).unwrap();
            h.set("P2", MechanicSlot::Velocity, v2).unwrap();
            let c1_old = h.get("P1", MechanicSlot::WaveVariable).unwrap();
            let c2_old = h.get("P2", MechanicSlot::WaveVariable).unwrap();
            h.step();
            prop_assert_eq!(h.get("P1", MechanicSlot::WaveVariable).unwrap(), c2_old + 2.0 * zc * v2);
            prop_assert_eq!(h.get("P2", MechanicSlot::WaveVariable).unwrap(), c1_old + 2.0 * zc * v1);
            prop_assert_eq!(h.get("P1", MechanicSlot::CharImpedance).unwrap(), zc);
        }
    }

    #[test]
    fn mass_never_leaves_its_range(
        forces in prop::collection::vec(-1e3f64..1e3, 1..200),
    ) {
        let mut h = Harness::of::<TranslationalMass>(1e-3).unwrap();
        h.set_parameter("m", 1.0).unwrap();
        h.set_parameter("x_min", -0.05).unwrap();
        h.set_parameter("x_max", 0.05).unwrap();
        h.connect("P1").unwrap();
        h.connect("P2").unwrap();
        h.initialize().unwrap();
        for f in forces {
            h.set("P1", MechanicSlot::WaveVariable, f).unwrap();
            h.step();
            let x = h.get("P2", MechanicSlot::Position).unwrap();
            prop_assert!((-0.05..=0.05).contains(&x));
            let v = h.get("P2", MechanicSlot::Velocity).unwrap();
            if x == 0.05 {
                prop_assert!(v <= 0.0);
            }
            if x == -0.05 {
                prop_assert!(v >= 0.0);
            }
        }
    }
}

#[test]
fn unconnected_input_variable_uses_parameter() {
    let mut h = Harness::of::<TranslationalSpring>(1e-3).unwrap();
    h.set_parameter("k", 2000.0).unwrap();
    h.connect("P1").unwrap();
    h.connect("P2").unwrap();
    h.initialize().unwrap();
    let zc = h.get("P2", MechanicSlot::CharImpedance).unwrap();
    assert!((zc - 2.0).abs() < 1e-12);
}

#[test]
fn connected_input_variable_overrides_parameter() {
    let mut h = Harness::of::<TranslationalSpring>(1e-3).unwrap();
    h.connect("P1").unwrap();
    h.connect("P2").unwrap();
    h.connect("k").unwrap();
    h.set("k", SignalSlot::Value, 3000.0).unwrap();
    h.initialize().unwrap();
    let zc = h.get("P2", MechanicSlot::CharImpedance).unwrap();
    assert!((zc - 3.0).abs() < 1e-12);
}

#[test]
fn required_power_port_must_be_connected() {
    let mut h = Harness::of::<TranslationalSpring>(1e-3).unwrap();
    h.connect("P1").unwrap();
    let err = h.initialize().unwrap_err();
    assert_eq!(
        err,
        ComponentError::Unconnected {
            component: "MechanicTranslationalSpring".into(),
            port: "P2".into(),
        }
    );
}

#[test]
fn wrong_slot_type_is_rejected() {
    let h = spring(1.0, 1e-3);
    assert!(h.get("P1", SignalSlot::Value).is_err());
}

#[test]
fn start_values_reach_the_node() {
    let mut h = Harness::of::<TranslationalMass>(1e-3).unwrap();
    h.connect("P1").unwrap();
    h.connect("P2").unwrap();
    h.instance_mut()
        .set_start_value("P2", MechanicSlot::Position, 0.3)
        .unwrap();
    h.initialize().unwrap();
    assert_eq!(h.get("P2", MechanicSlot::Position).unwrap(), 0.3);
}

#[test]
fn library_registers_every_component() {
    let mut factory = ComponentFactory::new();
    let mut nodes = NodeTypeRegistry::new();
    (LIBRARY.register)(&mut factory, &mut nodes).unwrap();
    assert_eq!(factory.len(), 18);
    for entry in factory.entries() {
        let instance = factory.create(entry.type_name).unwrap();
        assert_eq!(instance.cqs(), entry.cqs);
        assert!(!instance.ports().is_empty());
    }
    assert!(matches!(
        (LIBRARY.register)(&mut factory, &mut nodes),
        Err(ComponentError::DuplicateType { .. })
    ));
}
