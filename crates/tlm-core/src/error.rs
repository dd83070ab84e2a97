use thiserror::Error;

pub type TlmResult<T> = Result<T, TlmError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TlmError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: String, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Timestep {inner} does not evenly divide {outer}")]
    TimestepRatio { outer: f64, inner: f64 },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
