//! Boundary conditions for mechanic nodes.

use tlm_graph::{Cqs, MechanicSlot, NodeType, ReadRef, SlotRef};

use super::MechanicNode;
use crate::common::trapezoid;
use crate::context::{Configure, Initialize, Input, PowerPort, Step};
use crate::error::ComponentResult;
use crate::traits::{Component, ComponentType};

/// Prescribed force with zero impedance (C side).
#[derive(Debug)]
pub struct ForceSource {
    p1: PowerPort,
    force: Input,
    nodes: Option<(SlotRef, SlotRef, ReadRef)>,
}

impl ComponentType for ForceSource {
    const TYPE_NAME: &'static str = "MechanicForceSource";
    const CQS: Cqs = Cqs::C;
    const DESCRIPTION: &'static str = "Ideal force source";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            p1: cfg.power_port("P1", NodeType::Mechanic),
            force: cfg.input_variable("F", "Generated force", "N", 0.0),
            nodes: None,
        }
    }
}

impl Component for ForceSource {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let c = init.slot(self.p1, MechanicSlot::WaveVariable)?;
        let zc = init.slot(self.p1, MechanicSlot::CharImpedance)?;
        let force = init.input(self.force)?;
        // an explicit start wave on the node takes precedence
        if init.get(c) == 0.0 {
            let value = init.get(force);
            init.set(c, value);
        }
        init.set(zc, 0.0);
        self.nodes = Some((c, zc, force));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((c, zc, force)) = self.nodes else { return };
        let value = step.get(force);
        step.set(c, value);
        step.set(zc, 0.0);
    }
}

/// Prescribed velocity (Q side). Position follows by trapezoidal
/// integration.
#[derive(Debug)]
pub struct VelocitySource {
    p1: PowerPort,
    velocity: Input,
    v_old: f64,
    nodes: Option<(MechanicNode, ReadRef)>,
}

impl ComponentType for VelocitySource {
    const TYPE_NAME: &'static str = "MechanicVelocitySource";
    const CQS: Cqs = Cqs::Q;
    const DESCRIPTION: &'static str = "Ideal velocity source";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            p1: cfg.power_port("P1", NodeType::Mechanic),
            velocity: cfg.input_variable("v", "Generated velocity", "m/s", 0.0),
            v_old: 0.0,
            nodes: None,
        }
    }
}

impl Component for VelocitySource {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let p1 = MechanicNode::resolve(init, self.p1)?;
        let velocity = init.input(self.velocity)?;
        self.v_old = init.get(velocity);
        init.set(p1.v, self.v_old);
        self.nodes = Some((p1, velocity));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((p1, velocity)) = self.nodes else { return };
        let v = step.get(velocity);
        let x = trapezoid(step.get(p1.x), self.v_old, v, step.timestep());
        let f = step.get(p1.c) + step.get(p1.zc) * v;
        self.v_old = v;

        step.set(p1.v, v);
        step.set(p1.x, x);
        step.set(p1.f, f);
    }
}

/// Rigid wall: zero velocity, the force is whatever arrives.
#[derive(Debug)]
pub struct FixedPosition {
    p1: PowerPort,
    nodes: Option<MechanicNode>,
}

impl ComponentType for FixedPosition {
    const TYPE_NAME: &'static str = "MechanicFixedPosition";
    const CQS: Cqs = Cqs::Q;
    const DESCRIPTION: &'static str = "Fixed position";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            p1: cfg.power_port("Pm1", NodeType::Mechanic),
            nodes: None,
        }
    }
}

impl Component for FixedPosition {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let p1 = MechanicNode::resolve(init, self.p1)?;
        init.set(p1.v, 0.0);
        self.nodes = Some(p1);
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some(p1) = self.nodes else { return };
        let c = step.get(p1.c);
        step.set(p1.v, 0.0);
        step.set(p1.f, c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::Harness;
    use tlm_graph::SignalSlot;

    #[test]
    fn test_force_source_follows_signal() {
        let mut h = Harness::of::<ForceSource>(1e-3).unwrap();
        h.connect("P1").unwrap();
        h.connect("F").unwrap();
        h.set("F", SignalSlot::Value, 42.0).unwrap();
        h.initialize().unwrap();
        assert_eq!(h.get("P1", MechanicSlot::WaveVariable).unwrap(), 42.0);
        h.set("F", SignalSlot::Value, -7.0).unwrap();
        h.step();
        assert_eq!(h.get("P1", MechanicSlot::WaveVariable).unwrap(), -7.0);
        assert_eq!(h.get("P1", MechanicSlot::CharImpedance).unwrap(), 0.0);
    }

    #[test]
    fn test_force_source_keeps_start_wave() {
        let mut h = Harness::of::<ForceSource>(1e-3).unwrap();
        h.set_parameter("F", 5.0).unwrap();
        h.connect("P1").unwrap();
        h.set("P1", MechanicSlot::WaveVariable, 3.0).unwrap();
        h.initialize().unwrap();
        assert_eq!(h.get("P1", MechanicSlot::WaveVariable).unwrap(), 3.0);
        h.step();
        assert_eq!(h.get("P1", MechanicSlot::WaveVariable).unwrap(), 5.0);
    }

    #[test]
    fn test_velocity_source_integrates_position() {
        let mut h = Harness::of::<VelocitySource>(0.01).unwrap();
        h.set_parameter("v", 2.0).unwrap();
        h.connect("P1").unwrap();
        h.set("P1", MechanicSlot::WaveVariable, 1.0).unwrap();
        h.set("P1", MechanicSlot::CharImpedance, 3.0).unwrap();
        h.initialize().unwrap();
        h.run(100);
        assert!((h.get("P1", MechanicSlot::Position).unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(h.get("P1", MechanicSlot::Force).unwrap(), 7.0);
    }

    #[test]
    fn test_fixed_position_reflects_force() {
        let mut h = Harness::of::<FixedPosition>(1e-3).unwrap();
        h.connect("Pm1").unwrap();
        h.set("Pm1", MechanicSlot::WaveVariable, 12.5).unwrap();
        h.set("Pm1", MechanicSlot::Velocity, 4.0).unwrap();
        h.initialize().unwrap();
        h.step();
        assert_eq!(h.get("Pm1", MechanicSlot::Velocity).unwrap(), 0.0);
        assert_eq!(h.get("Pm1", MechanicSlot::Force).unwrap(), 12.5);
    }
}
