//! Signal outputs of mechanic node variables.

use tlm_graph::{Cqs, MechanicSlot, NodeType, ReadRef, Requirement, SlotRef};

use crate::context::{Configure, Initialize, Output, ReadPort, Step};
use crate::error::ComponentResult;
use crate::traits::{Component, ComponentType};

/// Copies one slot of a mechanic node to a signal output. The value is
/// available right after initialization.
#[derive(Debug)]
struct Probe {
    p1: ReadPort,
    out: Output,
    slot: MechanicSlot,
    refs: Option<(ReadRef, SlotRef)>,
}

impl Probe {
    fn configure(cfg: &mut Configure<'_>, slot: MechanicSlot) -> Self {
        Self {
            p1: cfg.read_port("P1", NodeType::Mechanic, Requirement::Required),
            out: cfg.output_variable("out", "Measured value"),
            slot,
            refs: None,
        }
    }

    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let input = init.read(self.p1, self.slot)?;
        let out = init.output(self.out)?;
        let value = init.get(input);
        init.set(out, value);
        self.refs = Some((input, out));
        Ok(())
    }

    fn measure(&self, step: &mut Step<'_>) {
        if let Some((input, out)) = self.refs {
            let value = step.get(input);
            step.set(out, value);
        }
    }
}

macro_rules! mechanic_sensors {
    ($($name:ident => $type_name:literal, $slot:ident, $doc:literal;)*) => {
        $(
            #[doc = $doc]
            #[derive(Debug)]
            pub struct $name(Probe);

            impl ComponentType for $name {
                const TYPE_NAME: &'static str = $type_name;
                const CQS: Cqs = Cqs::S;
                const DESCRIPTION: &'static str = $doc;

                fn configure(cfg: &mut Configure<'_>) -> Self {
                    Self(Probe::configure(cfg, MechanicSlot::$slot))
                }
            }

            impl Component for $name {
                fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
                    self.0.initialize(init)
                }

                fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
                    self.0.measure(step);
                }
            }
        )*
    };
}

mechanic_sensors! {
    PositionSensor => "MechanicPositionSensor", Position, "Position sensor";
    VelocitySensor => "MechanicVelocitySensor", Velocity, "Velocity sensor";
    ForceSensor => "MechanicForceSensor", Force, "Force sensor";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComponentError;
    use crate::harness::Harness;
    use tlm_graph::SignalSlot;

    #[test]
    fn test_position_sensor_reads_at_initialize() {
        let mut h = Harness::of::<PositionSensor>(1e-3).unwrap();
        h.connect("P1").unwrap();
        h.connect("out").unwrap();
        h.set("P1", MechanicSlot::Position, 3.14).unwrap();
        h.initialize().unwrap();
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), 3.14);
    }

    #[test]
    fn test_force_sensor_tracks_node() {
        let mut h = Harness::of::<ForceSensor>(1e-3).unwrap();
        h.connect("P1").unwrap();
        h.connect("out").unwrap();
        h.initialize().unwrap();
        h.set("P1", MechanicSlot::Force, -9.0).unwrap();
        h.step();
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), -9.0);
    }

    #[test]
    fn test_sensor_requires_node() {
        let mut h = Harness::of::<VelocitySensor>(1e-3).unwrap();
        assert!(matches!(h.initialize(), Err(ComponentError::Unconnected { .. })));
    }
}
