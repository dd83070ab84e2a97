//! tlm-project: model documents and their translation to live systems.

pub mod build;
pub mod migrate;
pub mod schema;
pub mod validate;

use std::path::Path;

pub use build::{build_model, build_system, snapshot_model, snapshot_system};
pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{ValidationError, validate_model};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("Build error: {0}")]
    Build(#[from] tlm_sim::SimError),

    #[error("Unsupported model file extension: {path}")]
    Extension { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn finish_load(model: ModelDocument) -> ProjectResult<ModelDocument> {
    let model = migrate_to_latest(model)?;
    validate_model(&model)?;
    Ok(model)
}

pub fn from_yaml_str(content: &str) -> ProjectResult<ModelDocument> {
    finish_load(serde_yaml::from_str(content)?)
}

pub fn from_json_str(content: &str) -> ProjectResult<ModelDocument> {
    finish_load(serde_json::from_str(content)?)
}

pub fn load_yaml(path: &Path) -> ProjectResult<ModelDocument> {
    from_yaml_str(&std::fs::read_to_string(path)?)
}

pub fn save_yaml(path: &Path, model: &ModelDocument) -> ProjectResult<()> {
    validate_model(model)?;
    let content = serde_yaml::to_string(model)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<ModelDocument> {
    from_json_str(&std::fs::read_to_string(path)?)
}

pub fn save_json(path: &Path, model: &ModelDocument) -> ProjectResult<()> {
    validate_model(model)?;
    let content = serde_json::to_string_pretty(model)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by extension: `.json`, or `.yaml`/`.yml`.
pub fn load(path: &Path) -> ProjectResult<ModelDocument> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        Some("yaml" | "yml") => load_yaml(path),
        _ => Err(ProjectError::Extension {
            path: path.display().to_string(),
        }),
    }
}
