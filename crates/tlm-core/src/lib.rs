//! tlm-core: shared foundation for the wave-variable simulation kernel.
//!
//! Contains:
//! - numeric (Real, tolerances, step counting)
//! - ids (node handles)
//! - error (shared error type)
//! - units (uom SI quantities used for typed parameter values)
//! - message (severity-tagged message queue drained by the caller)
//! - timing (opt-in wall clock timers)

pub mod error;
pub mod ids;
pub mod message;
pub mod numeric;
pub mod timing;
pub mod units;

pub use error::{TlmError, TlmResult};
pub use ids::*;
pub use message::{Message, MessageHandler, Severity};
pub use numeric::*;
pub use units::*;

/// Version of the component contract. Libraries built against a different
/// major.minor are refused at registration.
pub const KERNEL_VERSION: &str = "0.3.0";
