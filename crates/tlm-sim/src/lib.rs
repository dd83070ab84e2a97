//! tlm-sim: component systems and the simulation driver.
//!
//! Contains:
//! - system ([`ComponentSystem`]: assembly, validation, run control)
//! - flatten (one node arena for a whole hierarchy)
//! - order (per-system execution order)
//! - logging (strided node snapshots)
//! - essentials ([`Essentials`]: factories, registries, messages)
//!
//! # Example
//!
//! ```
//! use tlm_sim::{Essentials, SimOutcome};
//!
//! let mut essentials = Essentials::new();
//! let mut system = essentials.create_component_system();
//! system.set_desired_timestep(1e-3).unwrap();
//! let source = essentials.create_component("SignalConstant").unwrap();
//! let gain = essentials.create_component("SignalGain").unwrap();
//! let source = system.add_component(source).unwrap();
//! let gain = system.add_component(gain).unwrap();
//! system.set_parameter_value(&source, "y", 2.0).unwrap();
//! system.set_parameter_value(&gain, "k", 3.0).unwrap();
//! system.connect(&source, "out", &gain, "in").unwrap();
//!
//! system.initialize(0.0, 0.01).unwrap();
//! let outcome = system.simulate(0.01).unwrap();
//! assert!(matches!(outcome, SimOutcome::Completed { steps: 10, .. }));
//! assert_eq!(system.port_value(&gain, "out", "Value").unwrap(), 6.0);
//! system.finalize().unwrap();
//! ```

pub mod error;
pub mod essentials;
mod flatten;
pub mod logging;
mod order;
pub mod system;

pub use error::{SimError, SimResult};
pub use essentials::{BUILTIN_LIBRARIES, Essentials};
pub use logging::{LogSettings, NodeLog};
pub use system::{ComponentSystem, Connection, Endpoint, Member, SimOutcome, SystemState};
