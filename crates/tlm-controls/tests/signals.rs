//! Signal blocks through the harness and the library descriptor.

use proptest::prelude::*;
use tlm_components::harness::Harness;
use tlm_components::{ComponentFactory, ComponentType, Cqs, check_compatible};
use tlm_controls::{LIBRARY, Max, Min};
use tlm_graph::{NodeTypeRegistry, SignalSlot};

fn run_selector<T: ComponentType>(inputs: &[f64]) -> f64 {
    let mut h = Harness::of::<T>(1e-3).unwrap();
    for (i, &v) in inputs.iter().enumerate() {
        h.connect("in").unwrap();
        h.set_sub("in", i, SignalSlot::Value, v).unwrap();
    }
    h.connect("out").unwrap();
    h.initialize().unwrap();
    h.step();
    h.get("out", SignalSlot::Value).unwrap()
}

proptest! {
    #[test]
    fn max_matches_iterator_max(inputs in prop::collection::vec(-1e6f64..1e6, 1..12)) {
        let expected = inputs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(run_selector::<Max>(&inputs), expected);
    }

    #[test]
    fn min_never_exceeds_any_input(inputs in prop::collection::vec(-1e6f64..1e6, 1..12)) {
        let min = run_selector::<Min>(&inputs);
        prop_assert!(inputs.iter().all(|&v| min <= v));
        prop_assert!(inputs.contains(&min));
    }
}

#[test]
fn library_is_compatible_and_complete() {
    check_compatible(&(LIBRARY.info)()).unwrap();
    let mut factory = ComponentFactory::new();
    (LIBRARY.register)(&mut factory, &mut NodeTypeRegistry::new()).unwrap();
    assert_eq!(factory.len(), 15);
    assert!(factory.entries().all(|e| e.cqs == Cqs::S));
    assert!(factory.contains("SignalMax"));
    assert!(factory.contains("SignalUnitDelay"));
    assert!(factory.contains("SignalSecondOrderTransferFunction"));
}
