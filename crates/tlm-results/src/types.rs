//! Result data types.

use serde::{Deserialize, Serialize};
use tlm_project::ModelDocument;

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub model_name: String,
    pub timestamp: String,
    pub run: RunSpec,
    pub outcome: RunOutcome,
    pub kernel_version: String,
}

impl RunManifest {
    /// Manifest stamped with the current UTC time and a content hashed id.
    pub fn new(model: &ModelDocument, run: RunSpec, outcome: RunOutcome, kernel_version: &str) -> Self {
        Self {
            run_id: crate::hash::compute_run_id(model, &run, kernel_version),
            model_name: model.name.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            run,
            outcome,
            kernel_version: kernel_version.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSpec {
    pub start: f64,
    pub stop: f64,
    pub timestep: f64,
    pub log_samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RunOutcome {
    Completed { time: f64, steps: u64 },
    Stopped { time: f64, reason: String },
}

/// Logged values of one slot on one port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Series {
    pub component: String,
    pub port: String,
    pub slot: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(component: &str, port: &str, slot: &str, values: Vec<f64>) -> Self {
        Self {
            component: component.to_string(),
            port: port.to_string(),
            slot: slot.to_string(),
            values,
        }
    }

    /// `component.port.slot`; the component part may be a `/` path.
    pub fn label(&self) -> String {
        format!("{}.{}.{}", self.component, self.port, self.slot)
    }

    /// Inverse of [`Series::label`]. The slot and port are the last two
    /// dot-separated fields.
    pub fn parse_label(label: &str) -> Option<(String, String, String)> {
        let (rest, slot) = label.rsplit_once('.')?;
        let (component, port) = rest.rsplit_once('.')?;
        if component.is_empty() || port.is_empty() || slot.is_empty() {
            return None;
        }
        Some((component.to_string(), port.to_string(), slot.to_string()))
    }
}

/// A logged time axis with the series sampled on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    pub times: Vec<f64>,
    pub series: Vec<Series>,
}

impl SeriesSet {
    pub fn get(&self, label: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.label() == label)
    }
}
