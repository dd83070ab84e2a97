use tlm_graph::{Cqs, NodeType, ReadRef};

use super::HydraulicNode;
use crate::context::{Configure, Initialize, Input, PowerPort, Step};
use crate::error::ComponentResult;
use crate::traits::{Component, ComponentType};

/// Flow through a laminar orifice, `q = Kc (p1 - p2)`.
///
/// Pressures never go negative: a cavitating side is solved again with its
/// wave and impedance set to zero.
#[derive(Debug)]
pub struct LaminarOrifice {
    p1: PowerPort,
    p2: PowerPort,
    kc: Input,
    nodes: Option<(HydraulicNode, HydraulicNode, ReadRef)>,
}

fn solve(kc: f64, c1: f64, zc1: f64, c2: f64, zc2: f64) -> (f64, f64, f64) {
    let q2 = kc * (c1 - c2) / (1.0 + kc * (zc1 + zc2));
    (q2, c1 - q2 * zc1, c2 + q2 * zc2)
}

impl ComponentType for LaminarOrifice {
    const TYPE_NAME: &'static str = "HydraulicLaminarOrifice";
    const CQS: Cqs = Cqs::Q;
    const DESCRIPTION: &'static str = "Laminar orifice";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            p1: cfg.power_port("P1", NodeType::Hydraulic),
            p2: cfg.power_port("P2", NodeType::Hydraulic),
            kc: cfg.input_variable("Kc", "Pressure-flow coefficient", "m^5/Ns", 1.0e-11),
            nodes: None,
        }
    }
}

impl Component for LaminarOrifice {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let p1 = HydraulicNode::resolve(init, self.p1)?;
        let p2 = HydraulicNode::resolve(init, self.p2)?;
        let kc = init.input(self.kc)?;
        self.nodes = Some((p1, p2, kc));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((p1, p2, kc)) = self.nodes else { return };
        let kc = step.get(kc).abs();
        let (mut c1, mut zc1) = (step.get(p1.c), step.get(p1.zc));
        let (mut c2, mut zc2) = (step.get(p2.c), step.get(p2.zc));

        let (mut q2, mut pr1, mut pr2) = solve(kc, c1, zc1, c2, zc2);
        if pr1 < 0.0 || pr2 < 0.0 {
            if pr1 < 0.0 {
                (c1, zc1) = (0.0, 0.0);
            }
            if pr2 < 0.0 {
                (c2, zc2) = (0.0, 0.0);
            }
            (q2, pr1, pr2) = solve(kc, c1, zc1, c2, zc2);
            pr1 = pr1.max(0.0);
            pr2 = pr2.max(0.0);
        }

        step.set(p1.p, pr1);
        step.set(p1.q, -q2);
        step.set(p2.p, pr2);
        step.set(p2.q, q2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::Harness;
    use tlm_graph::HydraulicSlot;

    fn orifice() -> Harness {
        let mut h = Harness::of::<LaminarOrifice>(1e-3).unwrap();
        h.set_parameter("Kc", 1e-2).unwrap();
        h.connect("P1").unwrap();
        h.connect("P2").unwrap();
        h
    }

    #[test]
    fn test_flow_follows_pressure_drop() {
        let mut h = orifice();
        h.set("P1", HydraulicSlot::WaveVariable, 300.0).unwrap();
        h.set("P2", HydraulicSlot::WaveVariable, 100.0).unwrap();
        h.set("P1", HydraulicSlot::CharImpedance, 0.0).unwrap();
        h.set("P2", HydraulicSlot::CharImpedance, 0.0).unwrap();
        h.initialize().unwrap();
        h.step();
        assert!((h.get("P2", HydraulicSlot::Flow).unwrap() - 2.0).abs() < 1e-12);
        assert!((h.get("P1", HydraulicSlot::Flow).unwrap() + 2.0).abs() < 1e-12);
        assert_eq!(h.get("P1", HydraulicSlot::Pressure).unwrap(), 300.0);
    }

    #[test]
    fn test_pressure_never_negative() {
        let mut h = orifice();
        h.set("P1", HydraulicSlot::WaveVariable, -50.0).unwrap();
        h.set("P1", HydraulicSlot::CharImpedance, 0.0).unwrap();
        h.set("P2", HydraulicSlot::WaveVariable, 0.0).unwrap();
        h.set("P2", HydraulicSlot::CharImpedance, 100.0).unwrap();
        h.initialize().unwrap();
        h.step();
        // both sides cavitate
        assert_eq!(h.get("P1", HydraulicSlot::Pressure).unwrap(), 0.0);
        assert_eq!(h.get("P2", HydraulicSlot::Pressure).unwrap(), 0.0);
        assert_eq!(h.get("P2", HydraulicSlot::Flow).unwrap(), 0.0);
    }
}
