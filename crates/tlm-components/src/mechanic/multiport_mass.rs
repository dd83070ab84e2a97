use tlm_graph::{Cqs, MechanicSlot, NodeType, ReadRef};

use super::mass::positive_mass;
use crate::context::{Configure, Initialize, Input, MultiSlots, PowerMultiPort, Step};
use crate::error::{ComponentError, ComponentResult};
use crate::integrator::DoubleIntegratorWithDamping;
use crate::traits::{Component, ComponentType};

/// Slot handles of every sub-port on one side of the mass.
#[derive(Clone, Debug, Default)]
struct Side {
    f: MultiSlots,
    x: MultiSlots,
    v: MultiSlots,
    c: MultiSlots,
    zc: MultiSlots,
    me: MultiSlots,
    start_x: Vec<f64>,
}

impl Side {
    fn resolve(init: &mut Initialize<'_>, port: PowerMultiPort) -> ComponentResult<Self> {
        if init.num_ports(port) == 0 {
            return Err(ComponentError::Unconnected {
                component: init.name().to_string(),
                port: init.port_name(port).to_string(),
            });
        }
        let x = init.multi(port, MechanicSlot::Position)?;
        let start_x = x.iter().map(|s| init.get(s)).collect();
        Ok(Self {
            f: init.multi(port, MechanicSlot::Force)?,
            x,
            v: init.multi(port, MechanicSlot::Velocity)?,
            c: init.multi(port, MechanicSlot::WaveVariable)?,
            zc: init.multi(port, MechanicSlot::CharImpedance)?,
            me: init.multi(port, MechanicSlot::EquivalentMass)?,
            start_x,
        })
    }

    fn common_velocity(&self, init: &Initialize<'_>) -> Option<f64> {
        let mut velocities = self.v.iter().map(|s| init.get(s));
        let first = velocities.next()?;
        velocities.all(|v| v == first).then_some(first)
    }

    /// Write force, position, velocity and equivalent mass to each sub-port.
    fn write(&self, step: &mut Step<'_>, v: f64, x: impl Fn(f64) -> f64, m: f64) {
        let ports = self.c.iter().zip(self.zc.iter());
        for (i, (c, zc)) in ports.enumerate() {
            let f = step.get(c) + step.get(zc) * v;
            let start = self.start_x.get(i).copied().unwrap_or_default();
            for (slot, value) in [(self.f.get(i), f), (self.x.get(i), x(start)), (self.v.get(i), v), (self.me.get(i), m)] {
                if let Some(slot) = slot {
                    step.set(slot, value);
                }
            }
        }
    }
}

/// Translational mass whose ends may each connect to several nodes.
///
/// Wave variables and impedances of all sub-ports on a side are summed.
/// Each sub-port keeps its start offset relative to the first P2 sub-port.
#[derive(Debug)]
pub struct MultiPortTranslationalMass {
    p1: PowerMultiPort,
    p2: PowerMultiPort,
    m: Input,
    b: Input,
    x_min: Input,
    x_max: Input,
    integrator: DoubleIntegratorWithDamping,
    sides: Option<(Side, Side)>,
    signals: Option<[ReadRef; 4]>,
}

impl ComponentType for MultiPortTranslationalMass {
    const TYPE_NAME: &'static str = "MechanicMultiPortTranslationalMass";
    const CQS: Cqs = Cqs::Q;
    const DESCRIPTION: &'static str = "Translational mass with multi-ports on both ends";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            p1: cfg.power_multi_port("P1", NodeType::Mechanic),
            p2: cfg.power_multi_port("P2", NodeType::Mechanic),
            m: cfg.input_variable("m", "Mass", "kg", 100.0),
            b: cfg.input_variable("B", "Viscous friction", "Ns/m", 10.0),
            x_min: cfg.input_variable("x_min", "Minimum position of port P2", "m", -1.0e300),
            x_max: cfg.input_variable("x_max", "Maximum position of port P2", "m", 1.0e300),
            integrator: DoubleIntegratorWithDamping::default(),
            sides: None,
            signals: None,
        }
    }
}

impl Component for MultiPortTranslationalMass {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let p1 = Side::resolve(init, self.p1)?;
        let p2 = Side::resolve(init, self.p2)?;
        let signals = [
            init.input(self.m)?,
            init.input(self.b)?,
            init.input(self.x_min)?,
            init.input(self.x_max)?,
        ];
        let m = init.get(signals[0]);
        positive_mass(init, m)?;

        let (Some(v1), Some(v2)) = (p1.common_velocity(init), p2.common_velocity(init)) else {
            init.stop_simulation("start velocities within a multi-port do not match");
            return Ok(());
        };
        if v1 != -v2 {
            init.warning(format!("Start velocities of {}.P1 and {}.P2 do not match", init.name(), init.name()));
            init.stop_simulation("start velocities do not match");
        }
        for slot in p1.me.iter().chain(p2.me.iter()) {
            init.set(slot, m);
        }
        self.integrator
            .initialize(init.timestep(), 0.0, 0.0, p2.start_x[0], v2);
        self.sides = Some((p1, p2));
        self.signals = Some(signals);
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let (Some((p1, p2)), Some([m, b, x_min, x_max])) = (&self.sides, self.signals) else {
            return;
        };
        let m = step.get(m);
        if m <= 0.0 {
            step.stop_simulation(format!("mass must be positive, got {m}"));
            return;
        }
        let c1 = step.sum(&p1.c);
        let zc1 = step.sum(&p1.zc);
        let c2 = step.sum(&p2.c);
        let zc2 = step.sum(&p2.zc);

        self.integrator
            .set_damping((step.get(b) + zc1 + zc2) / m * step.timestep());
        self.integrator.integrate((c1 - c2) / m);
        let mut v2 = self.integrator.velocity();
        let mut x = self.integrator.position();
        let (x_min, x_max) = (step.get(x_min), step.get(x_max));
        if x < x_min {
            x = x_min;
            v2 = v2.max(0.0);
            self.integrator.initialize_values(0.0, x, v2);
        }
        if x > x_max {
            x = x_max;
            v2 = v2.min(0.0);
            self.integrator.initialize_values(0.0, x, v2);
        }

        let origin = p2.start_x[0];
        p1.write(step, -v2, |start| start + origin - x, m);
        p2.write(step, v2, |start| start - origin + x, m);
    }
}
