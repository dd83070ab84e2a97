//! Static signal arithmetic.

use tlm_components::{
    Component, ComponentResult, ComponentType, Configure, Cqs, Initialize, Input, MultiRead, Output,
    ReadMultiPort, Step,
};
use tlm_graph::{NodeType, ReadRef, Requirement, SignalSlot, SlotRef};

/// `out = k * in`.
#[derive(Debug)]
pub struct Gain {
    input: Input,
    k: Input,
    out: Output,
    refs: Option<(ReadRef, ReadRef, SlotRef)>,
}

impl ComponentType for Gain {
    const TYPE_NAME: &'static str = "SignalGain";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "Gain";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            input: cfg.input_variable("in", "Input", "-", 0.0),
            k: cfg.input_variable("k", "Gain", "-", 1.0),
            out: cfg.output_variable("out", "Output"),
            refs: None,
        }
    }
}

impl Component for Gain {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let refs = (init.input(self.input)?, init.input(self.k)?, init.output(self.out)?);
        init.set(refs.2, init.get(refs.0) * init.get(refs.1));
        self.refs = Some(refs);
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((input, k, out)) = self.refs else { return };
        let value = step.get(input) * step.get(k);
        step.set(out, value);
    }
}

/// Sum of every connected input. No inputs sum to zero.
#[derive(Debug)]
pub struct Sum {
    inputs: ReadMultiPort,
    out: Output,
    refs: Option<(MultiRead, SlotRef)>,
}

impl ComponentType for Sum {
    const TYPE_NAME: &'static str = "SignalSum";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "Sum of all inputs";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            inputs: cfg.read_multi_port("in", NodeType::Signal, Requirement::NotRequired),
            out: cfg.output_variable("out", "Sum"),
            refs: None,
        }
    }
}

impl Component for Sum {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let inputs = init.multi_read(self.inputs, SignalSlot::Value)?;
        let out = init.output(self.out)?;
        let total: f64 = inputs.iter().map(|r| init.get(r)).sum();
        init.set(out, total);
        self.refs = Some((inputs, out));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((inputs, out)) = &self.refs else { return };
        let total = step.sum(inputs);
        step.set(*out, total);
    }
}

/// `out = in1 - in2`.
#[derive(Debug)]
pub struct Subtract {
    in1: Input,
    in2: Input,
    out: Output,
    refs: Option<(ReadRef, ReadRef, SlotRef)>,
}

impl ComponentType for Subtract {
    const TYPE_NAME: &'static str = "SignalSubtract";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "Difference of two inputs";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            in1: cfg.input_variable("in1", "Minuend", "-", 0.0),
            in2: cfg.input_variable("in2", "Subtrahend", "-", 0.0),
            out: cfg.output_variable("out", "Difference"),
            refs: None,
        }
    }
}

impl Component for Subtract {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let refs = (init.input(self.in1)?, init.input(self.in2)?, init.output(self.out)?);
        init.set(refs.2, init.get(refs.0) - init.get(refs.1));
        self.refs = Some(refs);
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((in1, in2, out)) = self.refs else { return };
        let value = step.get(in1) - step.get(in2);
        step.set(out, value);
    }
}
