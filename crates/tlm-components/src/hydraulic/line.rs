use tlm_graph::{Cqs, NodeType};

use super::HydraulicNode;
use crate::context::{Configure, Initialize, PowerPort, Step};
use crate::delay::Delay;
use crate::error::{ComponentError, ComponentResult};
use crate::parameters::ParamHandle;
use crate::traits::{Component, ComponentType};

/// Lossless transmission line with a wave travel time of `TD`.
///
/// The C/Q exchange already costs one step, so the internal buffers hold
/// `round(TD / dt) - 1` steps (at least zero).
#[derive(Debug)]
pub struct LosslessLine {
    p1: PowerPort,
    p2: PowerPort,
    time_delay: ParamHandle,
    impedance: ParamHandle,
    alpha: ParamHandle,
    zc: f64,
    filter: f64,
    to_p1: Delay,
    to_p2: Delay,
    nodes: Option<(HydraulicNode, HydraulicNode)>,
}

impl ComponentType for LosslessLine {
    const TYPE_NAME: &'static str = "HydraulicLosslessLine";
    const CQS: Cqs = Cqs::C;
    const DESCRIPTION: &'static str = "Lossless hydraulic transmission line";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            p1: cfg.power_port("P1", NodeType::Hydraulic),
            p2: cfg.power_port("P2", NodeType::Hydraulic),
            time_delay: cfg.constant("TD", "Wave travel time", "s", 1.0e-3),
            impedance: cfg.constant("Zc", "Characteristic impedance", "Pa s/m^3", 1.0e9),
            alpha: cfg.constant("alpha", "Low pass coefficient", "-", 0.0),
            zc: 0.0,
            filter: 0.0,
            to_p1: Delay::default(),
            to_p2: Delay::default(),
            nodes: None,
        }
    }
}

impl Component for LosslessLine {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let zc = init.constant(self.impedance);
        let alpha = init.constant(self.alpha);
        let dt = init.timestep();
        if zc < 0.0 || !(0.0..1.0).contains(&alpha) {
            return Err(ComponentError::NonPhysical {
                what: format!("{}: Zc must be non-negative and alpha in [0, 1)", init.name()),
            });
        }
        let travel = (init.constant(self.time_delay) / dt).round();
        if travel < 1.0 {
            init.warning("time delay is shorter than one timestep, using one step");
        }
        // saturating cast, oversized delays are refused by Delay::new
        let steps = (travel.max(1.0) as usize) - 1;
        (self.zc, self.filter) = (zc, alpha);

        let p1 = HydraulicNode::resolve(init, self.p1)?;
        let p2 = HydraulicNode::resolve(init, self.p2)?;
        let name = init.name().to_string();
        let buffer = |initial: f64| {
            Delay::new(steps, initial).map_err(|e| ComponentError::NonPhysical {
                what: format!("{name}: TD {e}"),
            })
        };
        self.to_p1 = buffer(p1.seed_wave(init, zc))?;
        self.to_p2 = buffer(p2.seed_wave(init, zc))?;
        tracing::debug!(component = %name, buffered_steps = self.to_p1.steps(), "line delay sized");
        self.nodes = Some((p1, p2));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((p1, p2)) = self.nodes else { return };
        let (zc, alpha) = (self.zc, self.filter);
        let (c1, q1) = (step.get(p1.c), step.get(p1.q));
        let (c2, q2) = (step.get(p2.c), step.get(p2.q));

        let c10 = self.to_p1.update(c2 + 2.0 * zc * q2);
        let c20 = self.to_p2.update(c1 + 2.0 * zc * q1);
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

    #[test]
    fn test_wave_arrives_after_travel_time() {
        let mut h = Harness::of::<LosslessLine>(1e-3).unwrap();
        h.set_parameter("TD", 5e-3).unwrap();
        h.set_parameter("Zc", 10.0).unwrap();
        h.connect("P1").unwrap();
        h.connect("P2").unwrap();
        h.set("P1", HydraulicSlot::Pressure, 0.0).unwrap();
        h.set("P2", HydraulicSlot::Pressure, 0.0).unwrap();
        h.initialize().unwrap();

        h.set("P1", HydraulicSlot::Flow, 1.0).unwrap();
        h.step();
        h.set("P1", HydraulicSlot::Flow, 0.0).unwrap();
        let mut arrivals = Vec::new();
        for n in 1..10 {
            if h.get("P2", HydraulicSlot::WaveVariable).unwrap() != 0.0 {
                arrivals.push(n);
            }
            h.step();
        }
        // pushed during step 1, four buffered steps, visible after step 5
        assert_eq!(arrivals, vec![5]);
    }

    #[test]
    fn test_huge_travel_time_fails_initialize() {
        let mut h = Harness::of::<LosslessLine>(1e-3).unwrap();
        h.set_parameter("TD", 1e12).unwrap();
        h.connect("P1").unwrap();
        h.connect("P2").unwrap();
        match h.initialize() {
            Err(ComponentError::NonPhysical { what }) => assert!(what.contains("exceeds the limit")),
            other => panic!("expected a non-physical error, got {other:?}"),
        }
    }

    #[test]
    fn test_short_delay_behaves_like_single_step() {
        let mut h = Harness::of::<LosslessLine>(1e-3).unwrap();
        h.set_parameter("TD", 1e-3).unwrap();
        h.set_parameter("Zc", 2.0).unwrap();
        h.connect("P1").unwrap();
        h.connect("P2").unwrap();
        h.set("P2", HydraulicSlot::Pressure, 0.0).unwrap();
        h.set("P1", HydraulicSlot::Pressure, 0.0).unwrap();
        h.initialize().unwrap();
        h.set("P2", HydraulicSlot::Flow, 0.5).unwrap();
        h.step();
        assert_eq!(h.get("P1", HydraulicSlot::WaveVariable).unwrap(), 2.0);
    }
}
