use tlm_graph::{Cqs, NodeType, ReadRef};

use super::MechanicNode;
use crate::context::{Configure, Initialize, Input, PowerPort, Step};
use crate::error::{ComponentError, ComponentResult};
use crate::integrator::DoubleIntegratorWithDamping;
use crate::traits::{Component, ComponentType};

#[derive(Clone, Copy, Debug)]
struct Nodes {
    p1: MechanicNode,
    p2: MechanicNode,
    m: ReadRef,
    b: ReadRef,
    x_min: ReadRef,
    x_max: ReadRef,
}

/// Rigid body between two mechanic ports.
///
/// Integrates `(c1 - c2) / m` with damping `(b + Zc1 + Zc2) dt / m`. The
/// position of P2 is limited to `[x_min, x_max]`; at a limit the velocity
/// is cut to the side pointing back into the range and the integrator is
/// re-seeded there. P1 moves opposite to P2 at a fixed distance taken from
/// the start positions.
#[derive(Debug)]
pub struct TranslationalMass {
    p1: PowerPort,
    p2: PowerPort,
    m: Input,
    b: Input,
    x_min: Input,
    x_max: Input,
    length: f64,
    integrator: DoubleIntegratorWithDamping,
    nodes: Option<Nodes>,
}

pub(crate) fn positive_mass(init: &Initialize<'_>, mass: f64) -> ComponentResult<()> {
    if mass > 0.0 && mass.is_finite() {
        Ok(())
    } else {
        Err(ComponentError::NonPhysical {
            what: format!("{}: mass must be positive, got {}", init.name(), mass),
        })
    }
}

impl ComponentType for TranslationalMass {
    const TYPE_NAME: &'static str = "MechanicTranslationalMass";
    const CQS: Cqs = Cqs::Q;
    const DESCRIPTION: &'static str = "Translational mass with viscous friction and end stops";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            p1: cfg.power_port("P1", NodeType::Mechanic),
            p2: cfg.power_port("P2", NodeType::Mechanic),
            m: cfg.input_variable("m", "Mass", "kg", 100.0),
            b: cfg.input_variable("B", "Viscous friction", "Ns/m", 10.0),
            x_min: cfg.input_variable("x_min", "Lower limit of the P2 position", "m", -1.0e300),
            x_max: cfg.input_variable("x_max", "Upper limit of the P2 position", "m", 1.0e300),
            length: 0.0,
            integrator: DoubleIntegratorWithDamping::default(),
            nodes: None,
        }
    }
}

impl Component for TranslationalMass {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let nodes = Nodes {
            p1: MechanicNode::resolve(init, self.p1)?,
            p2: MechanicNode::resolve(init, self.p2)?,
            m: init.input(self.m)?,
            b: init.input(self.b)?,
            x_min: init.input(self.x_min)?,
            x_max: init.input(self.x_max)?,
        };
        let m = init.get(nodes.m);
        positive_mass(init, m)?;

        let x2 = init.get(nodes.p2.x);
        let v2 = init.get(nodes.p2.v);
        self.length = init.get(nodes.p1.x) + x2;
        self.integrator.initialize(init.timestep(), 0.0, 0.0, x2, v2);
        init.set(nodes.p1.me, m);
        init.set(nodes.p2.me, m);
        if init.get(nodes.p1.v) != -v2 {
            init.info(format!(
                "Start velocities of {}.P1 and {}.P2 do not match",
                init.name(),
                init.name()
            ));
        }
        self.nodes = Some(nodes);
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some(n) = self.nodes else { return };
        let c1 = step.get(n.p1.c);
        let zc1 = step.get(n.p1.zc);
        let c2 = step.get(n.p2.c);
        let zc2 = step.get(n.p2.zc);
        let m = step.get(n.m);
        if m <= 0.0 {
            step.stop_simulation(format!("mass must be positive, got {m}"));
            return;
        }
        let b = step.get(n.b);
        let (x_min, x_max) = (step.get(n.x_min), step.get(n.x_max));

        self.integrator.set_damping((b + zc1 + zc2) / m * step.timestep());
        self.integrator.integrate((c1 - c2) / m);
        let mut v2 = self.integrator.velocity();
        let mut x2 = self.integrator.position();
        if x2 < x_min {
            x2 = x_min;
            v2 = v2.max(0.0);
            self.integrator.initialize_values(0.0, x2, v2);
        }
        if x2 > x_max {
            x2 = x_max;
            v2 = v2.min(0.0);
            self.integrator.initialize_values(0.0, x2, v2);
        }
        let v1 = -v2;
        let x1 = -x2 + self.length;

        step.set(n.p1.f, c1 + zc1 * v1);
        step.set(n.p1.x, x1);
        step.set(n.p1.v, v1);
        step.set(n.p1.me, m);
        step.set(n.p2.f, c2 + zc2 * v2);
        step.set(n.p2.x, x2);
        step.set(n.p2.v, v2);
        step.set(n.p2.me, m);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::Harness;
    use tlm_graph::MechanicSlot;

    fn mass_harness(m: f64, b: f64) -> Harness {
        let mut h = Harness::of::<TranslationalMass>(1e-3).unwrap();
        h.set_parameter("m", m).unwrap();
        h.set_parameter("B", b).unwrap();
        h.connect("P1").unwrap();
        h.connect("P2").unwrap();
        h
    }

    #[test]
    fn test_reports_equivalent_mass() {
        let mut h = mass_harness(12.0, 0.0);
        h.initialize().unwrap();
        assert_eq!(h.get("P1", MechanicSlot::EquivalentMass).unwrap(), 12.0);
        assert_eq!(h.get("P2", MechanicSlot::EquivalentMass).unwrap(), 12.0);
    }

    #[test]
    fn test_rejects_non_positive_mass() {
        let mut h = mass_harness(0.0, 0.0);
        assert!(matches!(h.initialize(), Err(ComponentError::NonPhysical { .. })));
    }

    #[test]
    fn test_accelerates_towards_lower_wave_variable() {
        let mut h = mass_harness(1.0, 0.0);
        h.set("P1", MechanicSlot::WaveVariable, 10.0).unwrap();
        h.initialize().unwrap();
        h.run(100);
        let v2 = h.get("P2", MechanicSlot::Velocity).unwrap();
        assert!(v2 > 0.9 && v2 < 1.01, "v2 = {v2}");
        assert_eq!(h.get("P1", MechanicSlot::Velocity).unwrap(), -v2);
        assert_eq!(h.get("P2", MechanicSlot::Force).unwrap(), 0.0);
        assert_eq!(h.get("P1", MechanicSlot::Force).unwrap(), 10.0);
    }

    #[test]
    fn test_p1_keeps_distance() {
        let mut h = mass_harness(1.0, 0.0);
        h.set("P1", MechanicSlot::Position, 0.75).unwrap();
        h.set("P2", MechanicSlot::Position, 0.25).unwrap();
        h.set("P1", MechanicSlot::WaveVariable, 3.0).unwrap();
        h.initialize().unwrap();
        h.run(50);
        let x1 = h.get("P1", MechanicSlot::Position).unwrap();
        let x2 = h.get("P2", MechanicSlot::Position).unwrap();
        assert!((x1 + x2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clamps_at_upper_limit() {
        let mut h = mass_harness(1.0, 0.0);
        h.set_parameter("x_max", 0.01).unwrap();
        h.set("P1", MechanicSlot::WaveVariable, 100.0).unwrap();
        h.initialize().unwrap();
        for _ in 0..200 {
            h.step();
            let x2 = h.get("P2", MechanicSlot::Position).unwrap();
            assert!(x2 <= 0.01);
        }
        assert_eq!(h.get("P2", MechanicSlot::Position).unwrap(), 0.01);
        assert!(h.get("P2", MechanicSlot::Velocity).unwrap() <= 0.0);
    }

    #[test]
    fn test_clamps_at_lower_limit() {
        let mut h = mass_harness(1.0, 0.0);
        h.set_parameter("x_min", -0.01).unwrap();
        h.set("P2", MechanicSlot::WaveVariable, 100.0).unwrap();
        h.initialize().unwrap();
        h.run(200);
        assert_eq!(h.get("P2", MechanicSlot::Position).unwrap(), -0.01);
        assert!(h.get("P2", MechanicSlot::Velocity).unwrap() >= 0.0);
    }

    #[test]
    fn test_mass_from_signal_stops_when_zero() {
        let mut h = mass_harness(1.0, 0.0);
        h.connect("m").unwrap();
        h.set("m", tlm_graph::SignalSlot::Value, 2.0).unwrap();
        h.initialize().unwrap();
        h.step();
        assert!(h.stop_reason().is_none());
        h.set("m", tlm_graph::SignalSlot::Value, 0.0).unwrap();
        h.step();
        assert!(h.stop_reason().is_some());
    }
}
