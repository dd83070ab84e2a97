//! Signal blocks with memory.

use tlm_components::{
    Component, ComponentResult, ComponentType, Configure, Cqs, Initialize, Input, Output, ReadPort, Step,
};
use tlm_graph::{NodeType, PortDecl, ReadRef, Requirement, SignalSlot, SlotRef, SortHint};

/// One-step delay.
///
/// The input port does not order the block after its source; instead the
/// block runs before whoever writes its input, so it always sees the value
/// from the end of the previous step. This is what breaks algebraic loops
/// among signal components.
#[derive(Debug)]
pub struct UnitDelay {
    input: ReadPort,
    out: Output,
    refs: Option<(ReadRef, SlotRef)>,
}

impl ComponentType for UnitDelay {
    const TYPE_NAME: &'static str = "SignalUnitDelay";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "Unit delay";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            input: cfg.read_port_decl(
                PortDecl::read("in", NodeType::Signal, Requirement::NotRequired)
                    .with_sort_hint(SortHint::IndependentDestination),
            ),
            out: cfg.output_variable("out", "Input of the previous step"),
            refs: None,
        }
    }
}

impl Component for UnitDelay {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let input = init.read(self.input, SignalSlot::Value)?;
        let out = init.output(self.out)?;
        init.set(out, init.get(input));
        self.refs = Some((input, out));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((input, out)) = self.refs else { return };
        let previous = step.get(input);
        step.set(out, previous);
    }
}

/// Trapezoidal integrator.
#[derive(Debug)]
pub struct Integrator {
    input: Input,
    out: Output,
    previous_input: f64,
    refs: Option<(ReadRef, SlotRef)>,
}

impl ComponentType for Integrator {
    const TYPE_NAME: &'static str = "SignalIntegrator";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "Integrator";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            input: cfg.input_variable("in", "Integrand", "-", 0.0),
            out: cfg.output_variable("out", "Integral"),
            previous_input: 0.0,
            refs: None,
        }
    }
}

impl Component for Integrator {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let input = init.input(self.input)?;
        let out = init.output(self.out)?;
        self.previous_input = init.get(input);
        self.refs = Some((input, out));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((input, out)) = self.refs else { return };
        let u = step.get(input);
        let y = step.get(out) + 0.5 * step.timestep() * (u + self.previous_input);
        self.previous_input = u;
        step.set(out, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlm_components::harness::Harness;

    #[test]
    fn test_unit_delay_port_is_order_independent() {
        let h = Harness::of::<UnitDelay>(1e-3).unwrap();
        let port = h.instance().port("in").unwrap();
        assert_eq!(port.sort_hint, SortHint::IndependentDestination);
    }

    #[test]
    fn test_unit_delay_passes_node_value() {
        let mut h = Harness::of::<UnitDelay>(1e-3).unwrap();
        h.connect("in").unwrap();
        h.connect("out").unwrap();
        h.set("in", SignalSlot::Value, 1.5).unwrap();
        h.initialize().unwrap();
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), 1.5);
        h.set("in", SignalSlot::Value, 2.5).unwrap();
        h.step();
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), 2.5);
    }

    #[test]
    fn test_integrates_constant() {
        let mut h = Harness::of::<Integrator>(0.5).unwrap();
        h.set_parameter("in", 2.0).unwrap();
        h.connect("out").unwrap();
        h.set("out", SignalSlot::Value, 1.0).unwrap();
        h.initialize().unwrap();
        h.run(4);
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), 5.0);
    }

    #[test]
    fn test_integrates_ramp_exactly() {
        let mut h = Harness::of::<Integrator>(0.25).unwrap();
        h.connect("in").unwrap();
        h.connect("out").unwrap();
        h.initialize().unwrap();
        for n in 1..=4 {
            h.set("in", SignalSlot::Value, n as f64 * 0.25).unwrap();
            h.step();
        }
        // integral of t from 0 to 1
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), 0.5);
    }
}
