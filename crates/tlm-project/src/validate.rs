//! Structural checks that need no component library.
//!
//! Type names, port names and connection rules are checked by the kernel
//! when the document is built.

use std::collections::HashSet;

use tlm_sim::Endpoint;

use crate::schema::{ModelDocument, SystemDef};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate name: {name} in {context}")]
    DuplicateName { name: String, context: String },

    #[error("Invalid name: '{name}' in {context}")]
    InvalidName { name: String, context: String },

    #[error("Missing reference: {name} in {context}")]
    MissingReference { name: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_model(model: &ModelDocument) -> Result<(), ValidationError> {
    if model.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: model.version,
        });
    }

    let sim = &model.simulation;
    if !sim.start.is_finite() || !sim.stop.is_finite() {
        return Err(invalid("simulation.start/stop", sim.stop, "must be finite"));
    }
    if sim.stop < sim.start {
        return Err(invalid("simulation.stop", sim.stop, "before simulation.start"));
    }
    if !(sim.timestep.is_finite() && sim.timestep > 0.0) {
        return Err(invalid("simulation.timestep", sim.timestep, "must be positive"));
    }

    validate_system(&model.system, &model.system.name)
}

fn invalid(field: &str, value: f64, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn check_name(name: &str, context: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.contains(['.', '/']) || name.trim() != name {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            context: context.to_string(),
        });
    }
    Ok(())
}

fn validate_system(system: &SystemDef, path: &str) -> Result<(), ValidationError> {
    check_name(&system.name, path)?;
    if let Some(dt) = system.timestep
        && !dt.is_finite()
    {
        return Err(invalid(&format!("{path}.timestep"), dt, "must be finite"));
    }

    let mut names = HashSet::new();
    for name in system.member_names() {
        check_name(name, path)?;
        if !names.insert(name) {
            return Err(ValidationError::DuplicateName {
                name: name.to_string(),
                context: path.to_string(),
            });
        }
    }

    for (name, value) in &system.parameters {
        check_name(name, &format!("{path} parameters"))?;
        if !value.is_finite() {
            return Err(invalid(&format!("{path}.{name}"), *value, "must be finite"));
        }
    }

    for component in &system.components {
        let context = format!("{path}/{}", component.name);
        for (name, value) in &component.parameters {
            if !value.is_finite() {
                return Err(invalid(&format!("{context}.{name}"), *value, "must be finite"));
            }
        }
        for start in &component.start_values {
            if !start.value.is_finite() {
                return Err(invalid(
                    &format!("{context}.{}.{}", start.port, start.slot),
                    start.value,
                    "must be finite",
                ));
            }
        }
    }

    for connection in &system.connections {
        for end in [&connection.a, &connection.b] {
            let endpoint = Endpoint::parse(end).ok_or_else(|| ValidationError::InvalidName {
                name: end.clone(),
                context: format!("{path} connections"),
            })?;
            if !names.contains(endpoint.component.as_str()) {
                return Err(ValidationError::MissingReference {
                    name: end.clone(),
                    context: format!("{path} connections"),
                });
            }
        }
    }

    for sub in &system.subsystems {
        validate_system(sub, &format!("{path}/{}", sub.name))?;
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::schema::SimulationDef;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn run_interval_must_be_ordered(start in -10.0f64..10.0, len in -5.0f64..5.0, dt in 1e-6f64..1.0) {
            let model = ModelDocument {
                version: crate::LATEST_VERSION,
                name: "p".to_string(),
                simulation: SimulationDef { start, stop: start + len, timestep: dt, ..SimulationDef::default() },
                system: SystemDef::new("root"),
            };
            prop_assert_eq!(validate_model(&model).is_ok(), start + len >= start);
        }
    }
}
