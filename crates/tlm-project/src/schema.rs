//! Model document schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDocument {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub simulation: SimulationDef,
    pub system: SystemDef,
}

/// Run options for the top-level system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationDef {
    #[serde(default)]
    pub start: f64,
    #[serde(default = "default_stop")]
    pub stop: f64,
    #[serde(default = "default_timestep")]
    pub timestep: f64,
    #[serde(default = "default_log_samples")]
    pub log_samples: usize,
}

fn default_stop() -> f64 {
    1.0
}

fn default_timestep() -> f64 {
    1e-3
}

fn default_log_samples() -> usize {
    2048
}

fn default_true() -> bool {
    true
}

impl Default for SimulationDef {
    fn default() -> Self {
        Self {
            start: 0.0,
            stop: default_stop(),
            timestep: default_timestep(),
            log_samples: default_log_samples(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemDef {
    pub name: String,
    /// Own timestep of a subsystem; ignored for the top level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestep: Option<f64>,
    #[serde(default = "default_true")]
    pub inherit_timestep: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default)]
    pub components: Vec<ComponentDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsystems: Vec<SystemDef>,
    #[serde(default)]
    pub connections: Vec<ConnectionDef>,
}

impl SystemDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            timestep: None,
            inherit_timestep: true,
            parameters: BTreeMap::new(),
            ports: Vec::new(),
            components: Vec::new(),
            subsystems: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Names of everything addressable as a connection end.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.subsystems.iter().map(|s| s.name.as_str()))
            .chain(self.ports.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, f64>,
    /// Parameter name to system parameter name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub start_values: Vec<StartValueDef>,
}

impl ComponentDef {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            parameters: BTreeMap::new(),
            bindings: BTreeMap::new(),
            start_values: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, name: &str, value: f64) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartValueDef {
    pub port: String,
    /// Long or short slot name, e.g. `Position` or `x`.
    pub slot: String,
    pub value: f64,
}

/// Ends are `component.port`, or a bare system port name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionDef {
    pub a: String,
    pub b: String,
}

impl ConnectionDef {
    pub fn new(a: &str, b: &str) -> Self {
        Self {
            a: a.to_string(),
            b: b.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let yaml = r#"
version: 2
name: minimal
system:
  name: root
  components:
    - name: k
      type: SignalConstant
      parameters: { y: 2.0 }
"#;
        let model: ModelDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(model.simulation, SimulationDef::default());
        assert!(model.system.inherit_timestep);
        assert_eq!(model.system.components[0].type_name, "SignalConstant");
        assert_eq!(model.system.components[0].parameters["y"], 2.0);
        assert!(model.system.connections.is_empty());
    }

    #[test]
    fn empty_sections_are_not_written() {
        let mut system = SystemDef::new("root");
        system.components.push(ComponentDef::new("k", "SignalConstant"));
        let yaml = serde_yaml::to_string(&system).unwrap();
        assert!(!yaml.contains("subsystems"));
        assert!(!yaml.contains("start_values"));
        assert!(yaml.contains("type: SignalConstant"));
    }
}
