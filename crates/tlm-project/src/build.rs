//! Documents to live systems and back.
//!
//! [`snapshot_system`] reads a system only through the kernel's public
//! introspection, so `build` followed by `snapshot` reproduces a document
//! that lists non-default parameter values and long slot names.

use tlm_components::ComponentInstance;
use tlm_sim::{ComponentSystem, Endpoint, Essentials, LogSettings, Member};

use crate::schema::{ComponentDef, ConnectionDef, ModelDocument, SimulationDef, StartValueDef, SystemDef};
use crate::validate::{ValidationError, validate_model};
use crate::{LATEST_VERSION, ProjectResult};

/// Validate `model` and build its top-level system with the run options
/// of its `simulation` section applied.
pub fn build_model(essentials: &mut Essentials, model: &ModelDocument) -> ProjectResult<ComponentSystem> {
    validate_model(model)?;
    let mut system = build_system(essentials, &model.system)?;
    system.set_desired_timestep(model.simulation.timestep)?;
    system.set_log_settings(LogSettings {
        samples: model.simulation.log_samples,
        start_time: model.simulation.start,
    });
    tracing::debug!(
        model = %model.name,
        members = system.members().len(),
        "built model"
    );
    Ok(system)
}

fn endpoint(text: &str, system: &str) -> Result<Endpoint, ValidationError> {
    Endpoint::parse(text).ok_or_else(|| ValidationError::InvalidName {
        name: text.to_string(),
        context: format!("{system} connections"),
    })
}

pub fn build_system(essentials: &mut Essentials, def: &SystemDef) -> ProjectResult<ComponentSystem> {
    let mut system = essentials.create_component_system();
    system.set_name(&def.name)?;
    if let Some(dt) = def.timestep {
        system.set_desired_timestep(dt)?;
    }
    system.set_inherit_timestep(def.inherit_timestep);
    for (name, value) in &def.parameters {
        system.set_system_parameter(name, *value)?;
    }

    for component_def in &def.components {
        let mut component = essentials.create_component(&component_def.type_name)?;
        component.set_name(&component_def.name);
        let name = system.add_component(component)?;
        for (parameter, value) in &component_def.parameters {
            system.set_parameter_value(&name, parameter, *value)?;
        }
        for (parameter, binding) in &component_def.bindings {
            system.bind_parameter(&name, parameter, binding)?;
        }
        for start in &component_def.start_values {
            system.set_start_value(&name, &start.port, &start.slot, start.value)?;
        }
    }

    for sub_def in &def.subsystems {
        let sub = build_system(essentials, sub_def)?;
        system.add_subsystem(sub)?;
    }
    for port in &def.ports {
        system.add_system_port(port)?;
    }
    for connection in &def.connections {
        let a = endpoint(&connection.a, &def.name)?;
        let b = endpoint(&connection.b, &def.name)?;
        system.connect_endpoints(a, b)?;
    }
    Ok(system)
}

fn snapshot_component(system: &ComponentSystem, component: &ComponentInstance) -> ComponentDef {
    let mut def = ComponentDef::new(component.name(), component.type_name());
    for parameter in component.parameters().iter() {
        match &parameter.binding {
            Some(binding) => {
                def.bindings.insert(parameter.name.clone(), binding.clone());
            }
            None if parameter.value != parameter.default => {
                def.parameters.insert(parameter.name.clone(), parameter.value);
            }
            None => {}
        }
    }
    for start in component.start_values() {
        let decl = &component.ports()[start.port];
        let slot = decl
            .node_type
            .and_then(|nt| system.registry().descriptions(nt).get(start.slot))
            .map(|d| d.name.clone())
            .unwrap_or_else(|| start.slot.to_string());
        def.start_values.push(StartValueDef {
            port: decl.name.clone(),
            slot,
            value: start.value,
        });
    }
    def
}

/// Document form of a live system. A subsystem that inherits its parent's
/// timestep is written without one.
pub fn snapshot_system(system: &ComponentSystem) -> SystemDef {
    let mut def = SystemDef::new(system.name());
    if !system.inherits_timestep() {
        def.timestep = Some(system.desired_timestep());
    }
    def.inherit_timestep = system.inherits_timestep();
    def.parameters = system.system_parameters().clone();
    def.ports = system.system_ports().iter().map(|p| p.name.clone()).collect();
    for member in system.members() {
        match member {
            Member::Component(c) => def.components.push(snapshot_component(system, c)),
            Member::System(sub) => def.subsystems.push(snapshot_system(sub)),
        }
    }
    def.connections = system
        .connections()
        .iter()
        .map(|c| ConnectionDef {
            a: c.a.to_string(),
            b: c.b.to_string(),
        })
        .collect();
    def
}

/// Document for a top-level system; its timestep and log settings go to
/// the `simulation` section, start and stop come from `run`.
pub fn snapshot_model(system: &ComponentSystem, run: &SimulationDef) -> ModelDocument {
    let mut root = snapshot_system(system);
    root.timestep = None;
    root.inherit_timestep = true;
    ModelDocument {
        version: LATEST_VERSION,
        name: system.name().to_string(),
        simulation: SimulationDef {
            timestep: system.desired_timestep(),
            log_samples: system.log_settings().samples,
            ..run.clone()
        },
        system: root,
    }
}
