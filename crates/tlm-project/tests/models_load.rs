use std::path::{Path, PathBuf};

use tlm_project::{build_model, load_yaml};
use tlm_sim::{Essentials, SimOutcome};

fn models_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../models")
}

fn run(name: &str) -> tlm_sim::ComponentSystem {
    let model = load_yaml(&models_dir().join(name)).unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
    let mut essentials = Essentials::new();
    let mut system = build_model(&mut essentials, &model).unwrap_or_else(|e| panic!("Failed to build {}: {}", name, e));
    system.initialize(model.simulation.start, model.simulation.stop).unwrap();
    let outcome = system.simulate(model.simulation.stop).unwrap();
    assert!(matches!(outcome, SimOutcome::Completed { .. }), "{name}: {outcome:?}");
    system
}

#[test]
fn mass_spring_model_oscillates() {
    let system = run("mass_spring.yaml");
    let x = system.log_series("mass", "P2", "Position").unwrap();
    let lowest = x.iter().copied().fold(f64::INFINITY, f64::min);
    assert!(lowest < -0.15 && lowest > -0.25, "lowest = {lowest}");
}

#[test]
fn position_control_model_reaches_target() {
    let system = run("position_control.yaml");
    let x = system.port_value("mass", "P2", "Position").unwrap();
    assert!((x - 0.1).abs() < 0.02, "x = {x}");
}

#[test]
fn subcycled_clock_model_scales_inner_time() {
    let system = run("subcycled_clock.yaml");
    let fast = system.subsystem("fast").unwrap();
    assert_eq!(fast.steps_taken(), 40);
    let scaled = system.port_value("probe", "in", "Value").unwrap();
    assert!((scaled - 0.02).abs() < 1e-12, "scaled = {scaled}");
    let held = system.port_value("held", "out", "Value").unwrap();
    assert!((held - 0.009).abs() < 1e-12, "held = {held}");
}
