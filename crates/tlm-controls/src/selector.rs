//! Max and Min selectors over a read multi-port.
//!
//! With no connected inputs the output holds 0.0 and a warning is issued
//! at initialization.
//!
//! NaN inputs are skipped, following `f64::max`/`f64::min`: the output is
//! NaN only when every input is NaN.

use tlm_components::{
    Component, ComponentResult, ComponentType, Configure, Cqs, Initialize, MultiRead, Output,
    ReadMultiPort, Step,
};
use tlm_graph::{NodeType, Requirement, SignalSlot, SlotRef};

#[derive(Debug)]
struct Selector {
    inputs: ReadMultiPort,
    out: Output,
    pick: fn(f64, f64) -> f64,
    refs: Option<(MultiRead, SlotRef)>,
}

impl Selector {
    fn configure(cfg: &mut Configure<'_>, pick: fn(f64, f64) -> f64) -> Self {
        Self {
            inputs: cfg.read_multi_port("in", NodeType::Signal, Requirement::NotRequired),
            out: cfg.output_variable("out", "Selected value"),
            pick,
            refs: None,
        }
    }

    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let inputs = init.multi_read(self.inputs, SignalSlot::Value)?;
        let out = init.output(self.out)?;
        let selected = inputs.iter().map(|r| init.get(r)).reduce(self.pick);
        if selected.is_none() {
            init.warning("no inputs connected, output is 0");
        }
        init.set(out, selected.unwrap_or(0.0));
        self.refs = Some((inputs, out));
        Ok(())
    }

    fn select(&self, step: &mut Step<'_>) {
        let Some((inputs, out)) = &self.refs else { return };
        let selected = step.values(inputs).reduce(self.pick);
        if let Some(selected) = selected {
            step.set(*out, selected);
        }
    }
}

macro_rules! selectors {
    ($($name:ident => $type_name:literal, $pick:path, $doc:literal;)*) => {
        $(
            #[doc = $doc]
            #[derive(Debug)]
            pub struct $name(Selector);

            impl ComponentType for $name {
                const TYPE_NAME: &'static str = $type_name;
                const CQS: Cqs = Cqs::S;
                const DESCRIPTION: &'static str = $doc;

                fn configure(cfg: &mut Configure<'_>) -> Self {
                    Self(Selector::configure(cfg, $pick))
                }
            }

            impl Component for $name {
                fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
                    self.0.initialize(init)
                }

                fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
                    self.0.select(step);
                }
            }
        )*
    };
}

selectors! {
    Max => "SignalMax", f64::max, "Largest of all inputs";
    Min => "SignalMin", f64::min, "Smallest of all inputs";
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlm_components::harness::Harness;
    use tlm_core::Severity;

    fn selector<T: ComponentType>(inputs: &[f64]) -> Harness {
        let mut h = Harness::of::<T>(1e-3).unwrap();
        for (i, &v) in inputs.iter().enumerate() {
            h.connect("in").unwrap();
            h.set_sub("in", i, SignalSlot::Value, v).unwrap();
        }
        h.connect("out").unwrap();
        h
    }

    #[test]
    fn test_max_of_three() {
        let mut h = selector::<Max>(&[2.0, 7.5, -1.0]);
        h.initialize().unwrap();
        h.step();
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), 7.5);

        for (i, v) in [-5.0, -2.0, -9.0].into_iter().enumerate() {
            h.set_sub("in", i, SignalSlot::Value, v).unwrap();
        }
        h.step();
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), -2.0);
    }

    #[test]
    fn test_min_of_three() {
        let mut h = selector::<Min>(&[2.0, 7.5, -1.0]);
        h.initialize().unwrap();
        h.step();
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), -1.0);
    }

    #[test]
    fn test_nan_inputs_are_skipped() {
        let mut h = selector::<Max>(&[1.0, f64::NAN, 3.0]);
        h.initialize().unwrap();
        h.step();
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), 3.0);

        let mut h = selector::<Min>(&[f64::NAN, f64::NAN]);
        h.initialize().unwrap();
        h.step();
        assert!(h.get("out", SignalSlot::Value).unwrap().is_nan());
    }

    #[test]
    fn test_no_inputs_outputs_zero_with_warning() {
        let mut h = selector::<Max>(&[]);
        h.set("out", SignalSlot::Value, 42.0).unwrap();
        h.initialize().unwrap();
        assert_eq!(h.messages().emitted(Severity::Warning), 1);
        h.step();
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), 0.0);
    }
}
