//! Signal (S-type) component library.
//!
//! Signal components read and write `NodeSignal` values and run before all
//! C and Q components in each step, sorted so that every writer runs
//! before its readers. A [`UnitDelay`] is the exception: it reads the
//! previous step's value and therefore breaks signal loops.
//!
//! Register [`LIBRARY`] with a component factory to make the blocks
//! available by type name.

pub mod arithmetic;
pub mod controller;
pub mod dynamic;
pub mod filters;
pub mod sampled;
pub mod selector;
pub mod sources;

pub use arithmetic::{Gain, Subtract, Sum};
pub use controller::{PIController, PiLaw};
pub use dynamic::{Integrator, UnitDelay};
pub use filters::{FirstOrderFilter, SecondOrderFilter};
pub use sampled::{SampleClock, SampleHold, ZeroOrderHold};
pub use selector::{Max, Min};
pub use sources::{Constant, Sine, StepSignal, Time};

use tlm_components::{ComponentFactory, ComponentResult, LibraryDescriptor, LibraryInfo};
use tlm_core::KERNEL_VERSION;
use tlm_graph::NodeTypeRegistry;

fn library_info() -> LibraryInfo {
    LibraryInfo {
        name: "tlm-controls",
        kernel_version: KERNEL_VERSION,
    }
}

fn register(factory: &mut ComponentFactory, _nodes: &mut NodeTypeRegistry) -> ComponentResult<()> {
    factory.register::<Constant>()?;
    factory.register::<StepSignal>()?;
    factory.register::<Sine>()?;
    factory.register::<Time>()?;
    factory.register::<Gain>()?;
    factory.register::<Sum>()?;
    factory.register::<Subtract>()?;
    factory.register::<Max>()?;
    factory.register::<Min>()?;
    factory.register::<UnitDelay>()?;
    factory.register::<Integrator>()?;
    factory.register::<FirstOrderFilter>()?;
    factory.register::<SecondOrderFilter>()?;
    factory.register::<PIController>()?;
    factory.register::<SampleHold>()?;
    Ok(())
}

pub const LIBRARY: LibraryDescriptor = LibraryDescriptor {
    info: library_info,
    register,
};
