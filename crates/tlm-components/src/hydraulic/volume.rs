use tlm_graph::{Cqs, NodeType};

use super::HydraulicNode;
use crate::common::check_finite;
use crate::context::{Configure, Initialize, PowerPort, Step};
use crate::error::{ComponentError, ComponentResult};
use crate::parameters::ParamHandle;
use crate::traits::{Component, ComponentType};

/// Fluid volume with two ports.
///
/// `Zc = Beta_e dt / V / (1 - alpha)`; the low pass `alpha` damps
/// standing waves in chains of volumes.
#[derive(Debug)]
pub struct Volume {
    p1: PowerPort,
    p2: PowerPort,
    volume: ParamHandle,
    bulk_modulus: ParamHandle,
    alpha: ParamHandle,
    zc: f64,
    filter: f64,
    nodes: Option<(HydraulicNode, HydraulicNode)>,
}

impl ComponentType for Volume {
    const TYPE_NAME: &'static str = "HydraulicVolume";
    const CQS: Cqs = Cqs::C;
    const DESCRIPTION: &'static str = "Hydraulic volume";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            p1: cfg.power_port("P1", NodeType::Hydraulic),
            p2: cfg.power_port("P2", NodeType::Hydraulic),
            volume: cfg.constant("V", "Volume", "m^3", 1.0e-3),
            bulk_modulus: cfg.constant("Beta_e", "Bulk modulus", "Pa", 1.0e9),
            alpha: cfg.constant("alpha", "Low pass coefficient against standing waves", "-", 0.1),
            zc: 0.0,
            filter: 0.0,
            nodes: None,
        }
    }
}

impl Component for Volume {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let volume = init.constant(self.volume);
        let alpha = init.constant(self.alpha);
        if volume <= 0.0 || !(0.0..1.0).contains(&alpha) {
            return Err(ComponentError::NonPhysical {
                what: format!("{}: V must be positive and alpha in [0, 1)", init.name()),
            });
        }
        self.filter = alpha;
        self.zc = check_finite(
            init.constant(self.bulk_modulus) * init.timestep() / volume / (1.0 - alpha),
            "volume impedance",
        )?;
        let p1 = HydraulicNode::resolve(init, self.p1)?;
        let p2 = HydraulicNode::resolve(init, self.p2)?;
        p1.seed_wave(init, self.zc);
        p2.seed_wave(init, self.zc);
        self.nodes = Some((p1, p2));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((p1, p2)) = self.nodes else { return };
        let (zc, alpha) = (self.zc, self.filter);
        let (c1, q1) = (step.get(p1.c), step.get(p1.q));
        let (c2, q2) = (step.get(p2.c), step.get(p2.q));

        let c10 = c2 + 2.0 * zc * q2;
        let c20 = c1 + 2.0 * zc * q1;
        step.set(p1.c, alpha * c1 + (1.0 - alpha) * c10);
        step.set(p2.c, alpha * c2 + (1.0 - alpha) * c20);
        step.set(p1.zc, zc);
        step.set(p2.zc, zc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::Harness;
    use tlm_graph::HydraulicSlot;

    fn volume() -> Harness {
        let mut h = Harness::of::<Volume>(1e-3).unwrap();
        h.set_parameter("V", 1.0).unwrap();
        h.set_parameter("Beta_e", 900.0).unwrap();
        h.set_parameter("alpha", 0.1).unwrap();
        h.connect("P1").unwrap();
        h.connect("P2").unwrap();
        h
    }

    #[test]
    fn test_impedance_includes_filter() {
        let mut h = volume();
        h.initialize().unwrap();
        let zc = h.get("P1", HydraulicSlot::CharImpedance).unwrap();
        assert!((zc - 1.0).abs() < 1e-12);
        // default node pressure, no flow
        assert_eq!(h.get("P2", HydraulicSlot::WaveVariable).unwrap(), 1e5);
    }

    #[test]
    fn test_inflow_raises_pressure_wave() {
        let mut h = volume();
        h.initialize().unwrap();
        h.set("P1", HydraulicSlot::Flow, 1.0).unwrap();
        h.step();
        let c2 = h.get("P2", HydraulicSlot::WaveVariable).unwrap();
        // 0.1 * 1e5 + 0.9 * (1e5 + 2 * 1 * 1)
        assert!((c2 - (1e5 + 1.8)).abs() < 1e-6);
        assert!((h.get("P1", HydraulicSlot::WaveVariable).unwrap() - 1e5).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_bad_alpha() {
        let mut h = volume();
        h.set_parameter("alpha", 1.0).unwrap();
        assert!(h.initialize().is_err());
    }
}
