//! Schema migration.
//!
//! Version 1 had no `inherit_timestep` flag: a subsystem with a
//! `timestep` always ran at it. Version 2 inherits unless told otherwise.

use crate::ProjectError;
use crate::schema::{ModelDocument, SystemDef};

pub const LATEST_VERSION: u32 = 2;

pub fn migrate_to_latest(mut model: ModelDocument) -> Result<ModelDocument, ProjectError> {
    while model.version < LATEST_VERSION {
        model = migrate_one_version(model)?;
    }
    Ok(model)
}

fn migrate_one_version(model: ModelDocument) -> Result<ModelDocument, ProjectError> {
    match model.version {
        0 => migrate_v0_to_v1(model),
        1 => migrate_v1_to_v2(model),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

fn migrate_v0_to_v1(mut model: ModelDocument) -> Result<ModelDocument, ProjectError> {
    model.version = 1;
    Ok(model)
}

fn own_timestep_wins(system: &mut SystemDef) {
    for sub in &mut system.subsystems {
        if sub.timestep.is_some() {
            sub.inherit_timestep = false;
        }
        own_timestep_wins(sub);
    }
}

fn migrate_v1_to_v2(mut model: ModelDocument) -> Result<ModelDocument, ProjectError> {
    own_timestep_wins(&mut model.system);
    model.version = 2;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SimulationDef;

    fn model(version: u32, system: SystemDef) -> ModelDocument {
        ModelDocument {
            version,
            name: "test".to_string(),
            simulation: SimulationDef::default(),
            system,
        }
    }

    #[test]
    fn migrate_latest_is_noop() {
        let doc = model(LATEST_VERSION, SystemDef::new("root"));
        let migrated = migrate_to_latest(doc.clone()).unwrap();
        assert_eq!(migrated, doc);
    }

    #[test]
    fn v1_subsystem_timesteps_stop_inheriting() {
        let mut inner = SystemDef::new("inner");
        inner.timestep = Some(1e-4);
        let mut plain = SystemDef::new("plain");
        plain.subsystems.push(inner);
        let mut root = SystemDef::new("root");
        root.subsystems.push(plain);

        let migrated = migrate_to_latest(model(0, root)).unwrap();
        assert_eq!(migrated.version, LATEST_VERSION);
        let plain = &migrated.system.subsystems[0];
        assert!(plain.inherit_timestep);
        assert!(!plain.subsystems[0].inherit_timestep);
    }
}
