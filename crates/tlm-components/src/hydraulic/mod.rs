//! Hydraulic components.
//!
//! Pressure plays the role of force and flow the role of velocity: a Q
//! element computes `p = c + Zc q`, a C element returns `c + 2 Zc q` to
//! the opposite port one step later.

mod line;
mod orifice;
mod sensors;
mod sources;
mod volume;

pub use line::LosslessLine;
pub use orifice::LaminarOrifice;
pub use sensors::{FlowSensor, PressureSensor};
pub use sources::{FlowSource, PressureSource};
pub use volume::Volume;

use tlm_graph::{HydraulicSlot, NodeTypeRegistry, SlotRef};

use crate::context::{Initialize, PowerPort};
use crate::error::ComponentResult;
use crate::factory::ComponentFactory;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HydraulicNode {
    pub p: SlotRef,
    pub q: SlotRef,
    pub c: SlotRef,
    pub zc: SlotRef,
}

impl HydraulicNode {
    pub(crate) fn resolve(init: &mut Initialize<'_>, port: PowerPort) -> ComponentResult<Self> {
        Ok(Self {
            p: init.slot(port, HydraulicSlot::Pressure)?,
            q: init.slot(port, HydraulicSlot::Flow)?,
            c: init.slot(port, HydraulicSlot::WaveVariable)?,
            zc: init.slot(port, HydraulicSlot::CharImpedance)?,
        })
    }

    /// Seed the outgoing wave from the node's pressure and flow.
    pub(crate) fn seed_wave(&self, init: &mut Initialize<'_>, zc: f64) -> f64 {
        let c = init.get(self.p) - zc * init.get(self.q);
        init.set(self.c, c);
        init.set(self.zc, zc);
        c
    }
}

pub(crate) fn register(factory: &mut ComponentFactory, _nodes: &mut NodeTypeRegistry) -> ComponentResult<()> {
    factory.register::<Volume>()?;
    factory.register::<LosslessLine>()?;
    factory.register::<LaminarOrifice>()?;
    factory.register::<PressureSource>()?;
    factory.register::<FlowSource>()?;
    factory.register::<PressureSensor>()?;
    factory.register::<FlowSensor>()?;
    Ok(())
}
