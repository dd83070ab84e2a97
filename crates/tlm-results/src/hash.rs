//! Content-based hashing for run ids.

use sha2::{Digest, Sha256};
use tlm_project::ModelDocument;

use crate::types::RunSpec;

/// Same model, run options and kernel give the same id.
pub fn compute_run_id(model: &ModelDocument, run: &RunSpec, kernel_version: &str) -> String {
    let mut hasher = Sha256::new();

    let model_json = serde_json::to_string(model).unwrap_or_default();
    hasher.update(model_json.as_bytes());

    let run_json = serde_json::to_string(run).unwrap_or_default();
    hasher.update(run_json.as_bytes());

    hasher.update(kernel_version.as_bytes());

    format!("{:x}", hasher.finalize())
}
