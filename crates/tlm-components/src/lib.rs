//! tlm-components: component contract and the mechanic/hydraulic libraries.
//!
//! A component declares its ports and parameters in
//! [`ComponentType::configure`], resolves node slot handles in
//! [`Component::initialize`] and reads/writes them every step. Which slots
//! it may write is decided by the port kind: read ports only hand out
//! [`ReadRef`](tlm_graph::ReadRef)s.
//!
//! C components publish wave variables and impedances, Q components
//! compute intensity and flow from them, S components move signals.
//!
//! # Example
//!
//! ```
//! use tlm_components::harness::Harness;
//! use tlm_components::mechanic::TranslationalSpring;
//! use tlm_graph::MechanicSlot;
//!
//! let mut h = Harness::of::<TranslationalSpring>(1e-3).unwrap();
//! h.set_parameter("k", 500.0).unwrap();
//! h.connect("P1").unwrap();
//! h.connect("P2").unwrap();
//! h.initialize().unwrap();
//! h.set("P1", MechanicSlot::Velocity, 1.0).unwrap();
//! h.step();
//! assert!((h.get("P2", MechanicSlot::WaveVariable).unwrap() - 1.0).abs() < 1e-12);
//! ```

pub mod common;
pub mod context;
pub mod delay;
pub mod error;
pub mod factory;
pub mod harness;
pub mod hydraulic;
pub mod instance;
pub mod integrator;
pub mod lookup;
pub mod mechanic;
pub mod parameters;
pub mod traits;
pub mod transfer;

pub use context::{
    Clock, Configure, Initialize, Input, MultiRead, MultiSlots, Output, PowerMultiPort, PowerPort,
    ReadMultiPort, ReadPort, Step, StopFlag, WritePort,
};
pub use delay::Delay;
pub use error::{ComponentError, ComponentResult};
pub use factory::{ComponentEntry, ComponentFactory, LibraryDescriptor, LibraryInfo, check_compatible};
pub use instance::{ComponentInstance, Creator, StartValue};
pub use integrator::{DoubleIntegratorWithDamping, DoubleIntegratorWithDampingAndCoulombFriction};
pub use lookup::LookupTable1D;
pub use parameters::{ParamHandle, Parameter, Parameters};
pub use traits::{Component, ComponentType, Cqs};
pub use transfer::{FirstOrderTransferFunction, SecondOrderTransferFunction};

use tlm_core::KERNEL_VERSION;
use tlm_graph::NodeTypeRegistry;

fn library_info() -> LibraryInfo {
    LibraryInfo {
        name: "tlm-components",
        kernel_version: KERNEL_VERSION,
    }
}

fn register_library(factory: &mut ComponentFactory, nodes: &mut NodeTypeRegistry) -> ComponentResult<()> {
    mechanic::register(factory, nodes)?;
    hydraulic::register(factory, nodes)
}

/// Mechanic and hydraulic components.
pub const LIBRARY: LibraryDescriptor = LibraryDescriptor {
    info: library_info,
    register: register_library,
};
