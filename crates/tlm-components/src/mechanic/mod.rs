//! Translational mechanic components.

mod coulomb_mass;
mod damper;
mod mass;
mod multiport_mass;
mod sensors;
mod sources;
mod spring;

pub use coulomb_mass::TranslationalMassWithCoulombFriction;
pub use damper::TranslationalDamper;
pub use mass::TranslationalMass;
pub use multiport_mass::MultiPortTranslationalMass;
pub use sensors::{ForceSensor, PositionSensor, VelocitySensor};
pub use sources::{FixedPosition, ForceSource, VelocitySource};
pub use spring::TranslationalSpring;

use tlm_graph::{MechanicSlot, NodeTypeRegistry, SlotRef};

use crate::context::{Initialize, PowerPort};
use crate::error::ComponentResult;
use crate::factory::ComponentFactory;

/// Slot handles of one mechanic power port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MechanicNode {
    pub f: SlotRef,
    pub x: SlotRef,
    pub v: SlotRef,
    pub c: SlotRef,
    pub zc: SlotRef,
    pub me: SlotRef,
}

impl MechanicNode {
    pub(crate) fn resolve(init: &mut Initialize<'_>, port: PowerPort) -> ComponentResult<Self> {
        Ok(Self {
            f: init.slot(port, MechanicSlot::Force)?,
            x: init.slot(port, MechanicSlot::Position)?,
            v: init.slot(port, MechanicSlot::Velocity)?,
            c: init.slot(port, MechanicSlot::WaveVariable)?,
            zc: init.slot(port, MechanicSlot::CharImpedance)?,
            me: init.slot(port, MechanicSlot::EquivalentMass)?,
        })
    }
}

pub(crate) fn register(factory: &mut ComponentFactory, _nodes: &mut NodeTypeRegistry) -> ComponentResult<()> {
    factory.register::<TranslationalMass>()?;
    factory.register::<MultiPortTranslationalMass>()?;
    factory.register::<TranslationalMassWithCoulombFriction>()?;
    factory.register::<TranslationalSpring>()?;
    factory.register::<TranslationalDamper>()?;
    factory.register::<ForceSource>()?;
    factory.register::<VelocitySource>()?;
    factory.register::<FixedPosition>()?;
    factory.register::<PositionSensor>()?;
    factory.register::<VelocitySensor>()?;
    factory.register::<ForceSensor>()?;
    Ok(())
}
