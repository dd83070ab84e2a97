use tlm_graph::{Cqs, NodeType, ReadRef};

use super::MechanicNode;
use super::mass::positive_mass;
use crate::context::{Configure, Initialize, Input, PowerPort, Step};
use crate::error::ComponentResult;
use crate::integrator::DoubleIntegratorWithDampingAndCoulombFriction;
use crate::parameters::ParamHandle;
use crate::traits::{Component, ComponentType};

#[derive(Clone, Copy, Debug)]
struct Nodes {
    p1: MechanicNode,
    p2: MechanicNode,
    f_s: ReadRef,
    f_k: ReadRef,
}

/// Translational mass with static and kinetic Coulomb friction.
///
/// Friction forces may be driven by signals through the `f_s` and `f_k`
/// input variables. The body sticks while the net wave force does not
/// exceed the static level.
#[derive(Debug)]
pub struct TranslationalMassWithCoulombFriction {
    p1: PowerPort,
    p2: PowerPort,
    f_s: Input,
    f_k: Input,
    m: f64,
    b: f64,
    x_min: f64,
    x_max: f64,
    handles: [ParamHandle; 4],
    length: f64,
    integrator: DoubleIntegratorWithDampingAndCoulombFriction,
    nodes: Option<Nodes>,
}

impl ComponentType for TranslationalMassWithCoulombFriction {
    const TYPE_NAME: &'static str = "MechanicTranslationalMassWithCoulombFriction";
    const CQS: Cqs = Cqs::Q;
    const DESCRIPTION: &'static str = "Translational mass with Coulomb friction and end stops";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        let p1 = cfg.power_port("P1", NodeType::Mechanic);
        let p2 = cfg.power_port("P2", NodeType::Mechanic);
        let f_s = cfg.input_variable("f_s", "Static friction force", "N", 50.0);
        let f_k = cfg.input_variable("f_k", "Kinetic friction force", "N", 45.0);
        let handles = [
            cfg.constant("m", "Mass", "kg", 100.0),
            cfg.constant("b", "Viscous friction coefficient", "Ns/m", 10.0),
            cfg.constant("x_min", "Lower limit of the P2 position", "m", 0.0),
            cfg.constant("x_max", "Upper limit of the P2 position", "m", 1.0),
        ];
        Self {
            p1,
            p2,
            f_s,
            f_k,
            m: 0.0,
            b: 0.0,
            x_min: 0.0,
            x_max: 0.0,
            handles,
            length: 0.0,
            integrator: DoubleIntegratorWithDampingAndCoulombFriction::default(),
            nodes: None,
        }
    }
}

impl Component for TranslationalMassWithCoulombFriction {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let [m, b, x_min, x_max] = self.handles.map(|h| init.constant(h));
        positive_mass(init, m)?;
        (self.m, self.b, self.x_min, self.x_max) = (m, b, x_min, x_max);

        let nodes = Nodes {
            p1: MechanicNode::resolve(init, self.p1)?,
            p2: MechanicNode::resolve(init, self.p2)?,
            f_s: init.input(self.f_s)?,
            f_k: init.input(self.f_k)?,
        };
        let (f_s, f_k) = (init.get(nodes.f_s), init.get(nodes.f_k));
        let x2 = init.get(nodes.p2.x);
        self.length = init.get(nodes.p1.x) + x2;
        self.integrator
            .initialize(init.timestep(), 0.0, f_s / m, f_k / m, x2, 0.0);
        init.set(nodes.p1.me, m);
        init.set(nodes.p2.me, m);
        if init.get(nodes.p1.v) != -init.get(nodes.p2.v) {
            init.info(format!("Start velocities of {} do not match", init.name()));
        }
        self.nodes = Some(nodes);
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some(n) = self.nodes else { return };
        let m = self.m;
        let c1 = step.get(n.p1.c);
        let zc1 = step.get(n.p1.zc);
        let c2 = step.get(n.p2.c);
        let zc2 = step.get(n.p2.zc);

        self.integrator
            .set_friction(step.get(n.f_s) / m, step.get(n.f_k) / m);
        self.integrator
            .set_damping((self.b + zc1 + zc2) / m * step.timestep());
        self.integrator.integrate((c1 - c2) / m);
        let mut v2 = self.integrator.velocity();
        let mut x2 = self.integrator.position();
        if x2 < self.x_min {
            x2 = self.x_min;
            v2 = v2.max(0.0);
            self.integrator.initialize_values(0.0, x2, v2);
        }
        if x2 > self.x_max {
            x2 = self.x_max;
            v2 = v2.min(0.0);
            self.integrator.initialize_values(0.0, x2, v2);
        }
        let v1 = -v2;

        step.set(n.p1.f, c1 + zc1 * v1);
        step.set(n.p1.x, self.length - x2);
        step.set(n.p1.v, v1);
        step.set(n.p2.f, c2 + zc2 * v2);
        step.set(n.p2.x, x2);
        step.set(n.p2.v, v2);
    }
}
