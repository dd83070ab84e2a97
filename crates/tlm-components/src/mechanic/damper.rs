use tlm_graph::{Cqs, NodeType, ReadRef};

use super::MechanicNode;
use crate::common::{EPSILON_DET, trapezoid};
use crate::context::{Configure, Initialize, Input, PowerPort, Step};
use crate::error::ComponentResult;
use crate::traits::{Component, ComponentType};

/// Viscous damper solved against the impedances of both neighbours.
///
/// With `det = B Zc1 + B Zc2 + Zc1 Zc2` the common force and the port
/// velocities are
///
/// ```text
/// f  = B (c1 Zc2 + c2 Zc1) / det
/// v1 = (B c2 - (B + Zc2) c1) / det
/// v2 = (B c1 - (B + Zc1) c2) / det
/// ```
///
/// A vanishing determinant (no stiffness on either side) stops the run.
#[derive(Debug)]
pub struct TranslationalDamper {
    p1: PowerPort,
    p2: PowerPort,
    b: Input,
    nodes: Option<(MechanicNode, MechanicNode, ReadRef)>,
}

impl ComponentType for TranslationalDamper {
    const TYPE_NAME: &'static str = "MechanicTranslationalDamper";
    const CQS: Cqs = Cqs::Q;
    const DESCRIPTION: &'static str = "Viscous translational damper";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            p1: cfg.power_port("P1", NodeType::Mechanic),
            p2: cfg.power_port("P2", NodeType::Mechanic),
            b: cfg.input_variable("B", "Viscous friction", "Ns/m", 100.0),
            nodes: None,
        }
    }
}

impl Component for TranslationalDamper {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let p1 = MechanicNode::resolve(init, self.p1)?;
        let p2 = MechanicNode::resolve(init, self.p2)?;
        let b = init.input(self.b)?;
        self.nodes = Some((p1, p2, b));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((p1, p2, b)) = self.nodes else { return };
        let b = step.get(b);
        let (c1, z1) = (step.get(p1.c), step.get(p1.zc));
        let (c2, z2) = (step.get(p2.c), step.get(p2.zc));

        let det = b * z1 + b * z2 + z1 * z2;
        if det.abs() < EPSILON_DET {
            step.stop_simulation("damper determinant is zero; connect stiff elements on both sides");
            return;
        }
        let f = b * (c1 * z2 + c2 * z1) / det;
        let v1 = (b * c2 - (b + z2) * c1) / det;
        let v2 = (b * c1 - (b + z1) * c2) / det;
        let dt = step.timestep();
        let x1 = trapezoid(step.get(p1.x), step.get(p1.v), v1, dt);
        let x2 = trapezoid(step.get(p2.x), step.get(p2.v), v2, dt);

        step.set(p1.f, f);
        step.set(p1.v, v1);
        step.set(p1.x, x1);
        step.set(p2.f, f);
        step.set(p2.v, v2);
        step.set(p2.x, x2);
    }
}
