//! Core traits for component models.

use crate::context::{Configure, Initialize, Step};
use crate::error::ComponentResult;
pub use tlm_graph::Cqs;

/// Per-run behaviour of a component model.
///
/// Ports and parameters are declared when the model is built (see
/// [`ComponentType::configure`]) and are owned by the surrounding
/// [`ComponentInstance`](crate::ComponentInstance). The model only keeps
/// handles to them.
pub trait Component: Send {
    /// Resolve node slots, seed internal state and write step-zero outputs.
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()>;

    /// Advance one timestep. Must not allocate.
    fn simulate_one_timestep(&mut self, step: &mut Step<'_>);

    /// Release external resources at the end of a run.
    fn finalize(&mut self) {}
}

/// A component model that can be created by name.
pub trait ComponentType: Component + Sized + 'static {
    const TYPE_NAME: &'static str;
    const CQS: Cqs;
    const DESCRIPTION: &'static str = "";

    /// Declare ports and parameters and build the model.
    fn configure(cfg: &mut Configure<'_>) -> Self;
}
