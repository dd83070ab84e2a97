//! tlm-results: run manifests, logged series and reference comparison.

pub mod compare;
pub mod hash;
pub mod store;
pub mod types;

pub use compare::{Deviation, compare_series};
pub use hash::compute_run_id;
pub use store::{RunStore, read_csv, write_csv};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Malformed series file: {message}")]
    Malformed { message: String },
}
