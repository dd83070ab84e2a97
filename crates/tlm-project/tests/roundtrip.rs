use tlm_project::schema::*;
use tlm_project::{
    build_model, from_yaml_str, load, load_json, load_yaml, save_json, save_yaml, snapshot_model,
    validate_model,
};
use tlm_sim::Essentials;

fn oscillator() -> ModelDocument {
    let mut system = SystemDef::new("oscillator");
    system.parameters.insert("stiffness".to_string(), 250.0);
    system.components = vec![
        ComponentDef::new("wall", "MechanicFixedPosition"),
        ComponentDef {
            bindings: [("k".to_string(), "stiffness".to_string())].into(),
            ..ComponentDef::new("spring", "MechanicTranslationalSpring")
        },
        ComponentDef {
            start_values: vec![StartValueDef {
                port: "P2".to_string(),
                slot: "Position".to_string(),
                value: 0.05,
            }],
            ..ComponentDef::new("mass", "MechanicTranslationalMass").with_parameter("m", 2.0)
        },
        ComponentDef::new("force", "MechanicForceSource").with_parameter("F", 5.0),
    ];
    system.connections = vec![
        ConnectionDef::new("wall.Pm1", "spring.P1"),
        ConnectionDef::new("spring.P2", "mass.P1"),
        ConnectionDef::new("mass.P2", "force.P1"),
    ];
    ModelDocument {
        version: tlm_project::LATEST_VERSION,
        name: "oscillator".to_string(),
        simulation: SimulationDef {
            stop: 0.5,
            timestep: 1e-4,
            ..SimulationDef::default()
        },
        system,
    }
}

fn with_subsystem() -> ModelDocument {
    let mut inner = SystemDef::new("box");
    inner.timestep = Some(5e-5);
    inner.inherit_timestep = false;
    inner.ports = vec!["left".to_string(), "right".to_string()];
    inner.components = vec![ComponentDef::new("spring", "MechanicTranslationalSpring")];
    inner.connections = vec![
        ConnectionDef::new("left", "spring.P1"),
        ConnectionDef::new("spring.P2", "right"),
    ];
    let mut model = oscillator();
    model.system.components.retain(|c| c.name != "spring");
    model.system.subsystems.push(inner);
    model.system.connections = vec![
        ConnectionDef::new("wall.Pm1", "box.left"),
        ConnectionDef::new("box.right", "mass.P1"),
        ConnectionDef::new("mass.P2", "force.P1"),
    ];
    model
}

#[test]
fn roundtrip_yaml_and_json_files() {
    let model = with_subsystem();
    validate_model(&model).unwrap();

    let temp_dir = std::env::temp_dir().join("tlm_project_roundtrip");
    std::fs::create_dir_all(&temp_dir).unwrap();

    let yaml = temp_dir.join("model.yaml");
    save_yaml(&yaml, &model).unwrap();
    assert_eq!(load_yaml(&yaml).unwrap(), model);
    assert_eq!(load(&yaml).unwrap(), model);

    let json = temp_dir.join("model.json");
    save_json(&json, &model).unwrap();
    assert_eq!(load_json(&json).unwrap(), model);

    assert!(load(&temp_dir.join("model.txt")).is_err());
}

#[test]
fn build_then_snapshot_reproduces_document() {
    for model in [oscillator(), with_subsystem()] {
        let mut essentials = Essentials::new();
        let system = build_model(&mut essentials, &model).unwrap();
        let snapshot = snapshot_model(&system, &model.simulation);
        assert_eq!(snapshot, model);
    }
}

#[test]
fn built_model_runs_with_bound_parameters_and_start_values() {
    let model = oscillator();
    let mut essentials = Essentials::new();
    let mut system = build_model(&mut essentials, &model).unwrap();
    system.initialize(model.simulation.start, model.simulation.stop).unwrap();
    assert_eq!(system.port_value("mass", "P2", "Position").unwrap(), 0.05);

    let k = system.find_component("spring").unwrap().parameters().get("k").unwrap().value;
    assert_eq!(k, 250.0);

    let outcome = system.simulate(model.simulation.stop).unwrap();
    assert!(matches!(outcome, tlm_sim::SimOutcome::Completed { steps: 5000, .. }));
}

#[test]
fn kernel_rejections_surface_as_build_errors() {
    let mut model = oscillator();
    model.system.components[0].type_name = "NoSuchComponent".to_string();
    let mut essentials = Essentials::new();
    let err = build_model(&mut essentials, &model).unwrap_err();
    assert!(matches!(err, tlm_project::ProjectError::Build(_)));
    assert!(essentials.messages().has_errors());

    let mut model = oscillator();
    model.system.connections.push(ConnectionDef::new("mass.P1", "force.P1"));
    let mut essentials = Essentials::new();
    assert!(build_model(&mut essentials, &model).is_err());
}

#[test]
fn version_one_documents_are_migrated() {
    let yaml = r#"
version: 1
name: legacy
system:
  name: root
  subsystems:
    - name: fast
      timestep: 1.0e-4
"#;
    let model = from_yaml_str(yaml).unwrap();
    assert_eq!(model.version, tlm_project::LATEST_VERSION);
    assert!(!model.system.subsystems[0].inherit_timestep);

    let future = yaml.replace("version: 1", "version: 99");
    assert!(from_yaml_str(&future).is_err());
}
