use tlm_graph::{Cqs, NodeType, ReadRef};

use super::MechanicNode;
use crate::context::{Configure, Initialize, Input, PowerPort, Step};
use crate::error::ComponentResult;
use crate::traits::{Component, ComponentType};

/// Linear spring as a bilateral delay line.
///
/// With `Zc = k dt` each side's outgoing wave is built from the other
/// side's wave and velocity of the previous step:
///
/// ```text
/// c1 = c2_old + 2 Zc v2_old
/// c2 = c1_old + 2 Zc v1_old
/// ```
#[derive(Debug)]
pub struct TranslationalSpring {
    p1: PowerPort,
    p2: PowerPort,
    k: Input,
    nodes: Option<(MechanicNode, MechanicNode, ReadRef)>,
}

impl ComponentType for TranslationalSpring {
    const TYPE_NAME: &'static str = "MechanicTranslationalSpring";
    const CQS: Cqs = Cqs::C;
    const DESCRIPTION: &'static str = "Linear translational spring";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            p1: cfg.power_port("P1", NodeType::Mechanic),
            p2: cfg.power_port("P2", NodeType::Mechanic),
            k: cfg.input_variable("k", "Spring coefficient", "N/m", 100.0),
            nodes: None,
        }
    }
}

impl Component for TranslationalSpring {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let p1 = MechanicNode::resolve(init, self.p1)?;
        let p2 = MechanicNode::resolve(init, self.p2)?;
        let k = init.input(self.k)?;
        let zc = init.get(k) * init.timestep();

        for p in [p1, p2] {
            let c = init.get(p.f) - zc * init.get(p.v);
            init.set(p.c, c);
            init.set(p.zc, zc);
        }
        self.nodes = Some((p1, p2, k));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((p1, p2, k)) = self.nodes else { return };
        let zc = step.get(k) * step.timestep();
        let (c1_old, v1) = (step.get(p1.c), step.get(p1.v));
        let (c2_old, v2) = (step.get(p2.c), step.get(p2.v));

        step.set(p1.c, c2_old + 2.0 * zc * v2);
        step.set(p2.c, c1_old + 2.0 * zc * v1);
        step.set(p1.zc, zc);
        step.set(p2.zc, zc);
    }
}
