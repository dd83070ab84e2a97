//! Transfer function blocks.
//!
//! Coefficients follow ascending powers of `s`, e.g. `a1 s + a0`. The
//! output saturates at `y_min`/`y_max`.

use tlm_components::{
    Component, ComponentResult, ComponentType, Configure, Cqs, FirstOrderTransferFunction, Initialize, Input,
    Output, ParamHandle, SecondOrderTransferFunction, Step,
};
use tlm_graph::{ReadRef, SlotRef};

const NO_LIMIT: f64 = 1.5e300;

/// `(a1 s + a0) / (b1 s + b0)`.
#[derive(Debug)]
pub struct FirstOrderFilter {
    input: Input,
    out: Output,
    num: [ParamHandle; 2],
    den: [ParamHandle; 2],
    limits: [ParamHandle; 2],
    tf: FirstOrderTransferFunction,
    refs: Option<(ReadRef, SlotRef)>,
}

impl ComponentType for FirstOrderFilter {
    const TYPE_NAME: &'static str = "SignalFirstOrderTransferFunction";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "First order transfer function";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            input: cfg.input_variable("in", "Input", "-", 0.0),
            out: cfg.output_variable("out", "Filtered output"),
            num: [
                cfg.constant("a0", "Numerator s^0 coefficient", "-", 1.0),
                cfg.constant("a1", "Numerator s^1 coefficient", "-", 0.0),
            ],
            den: [
                cfg.constant("b0", "Denominator s^0 coefficient", "-", 1.0),
                cfg.constant("b1", "Denominator s^1 coefficient", "-", 1.0),
            ],
            limits: [
                cfg.constant("y_min", "Lower output limit", "-", -NO_LIMIT),
                cfg.constant("y_max", "Upper output limit", "-", NO_LIMIT),
            ],
            tf: FirstOrderTransferFunction::default(),
            refs: None,
        }
    }
}

impl Component for FirstOrderFilter {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let input = init.input(self.input)?;
        let out = init.output(self.out)?;
        let [y_min, y_max] = self.limits.map(|p| init.constant(p));
        self.tf = FirstOrderTransferFunction::new(
            init.timestep(),
            self.num.map(|p| init.constant(p)),
            self.den.map(|p| init.constant(p)),
            init.get(input),
            init.get(out),
            y_min,
            y_max,
        )?;
        init.set(out, self.tf.value());
        self.refs = Some((input, out));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((input, out)) = self.refs else { return };
        let y = self.tf.update(step.get(input));
        step.set(out, y);
    }
}

/// `(a2 s^2 + a1 s + a0) / (b2 s^2 + b1 s + b0)`.
#[derive(Debug)]
pub struct SecondOrderFilter {
    input: Input,
    out: Output,
    num: [ParamHandle; 3],
    den: [ParamHandle; 3],
    limits: [ParamHandle; 2],
    tf: SecondOrderTransferFunction,
    refs: Option<(ReadRef, SlotRef)>,
}

impl ComponentType for SecondOrderFilter {
    const TYPE_NAME: &'static str = "SignalSecondOrderTransferFunction";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "Second order transfer function";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            input: cfg.input_variable("in", "Input", "-", 0.0),
            out: cfg.output_variable("out", "Filtered output"),
            num: [
                cfg.constant("a0", "Numerator s^0 coefficient", "-", 1.0),
                cfg.constant("a1", "Numerator s^1 coefficient", "-", 0.0),
                cfg.constant("a2", "Numerator s^2 coefficient", "-", 0.0),
            ],
            den: [
                cfg.constant("b0", "Denominator s^0 coefficient", "-", 1.0),
                cfg.constant("b1", "Denominator s^1 coefficient", "-", 1.0),
                cfg.constant("b2", "Denominator s^2 coefficient", "-", 1.0),
            ],
            limits: [
                cfg.constant("y_min", "Lower output limit", "-", -NO_LIMIT),
                cfg.constant("y_max", "Upper output limit", "-", NO_LIMIT),
            ],
            tf: SecondOrderTransferFunction::default(),
            refs: None,
        }
    }
}

impl Component for SecondOrderFilter {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let input = init.input(self.input)?;
        let out = init.output(self.out)?;
        let [y_min, y_max] = self.limits.map(|p| init.constant(p));
        self.tf = SecondOrderTransferFunction::new(
            init.timestep(),
            self.num.map(|p| init.constant(p)),
            self.den.map(|p| init.constant(p)),
            init.get(input),
            init.get(out),
            y_min,
            y_max,
        )?;
        init.set(out, self.tf.value());
        self.refs = Some((input, out));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((input, out)) = self.refs else { return };
        let y = self.tf.update(step.get(input));
        step.set(out, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlm_components::ComponentError;
    use tlm_components::harness::Harness;
    use tlm_graph::SignalSlot;

    #[test]
    fn test_first_order_step_response() {
        let (dt, tau) = (1e-3, 0.05);
        let mut h = Harness::of::<FirstOrderFilter>(dt).unwrap();
        h.set_parameter("b1", tau).unwrap();
        h.connect("in").unwrap();
        h.connect("out").unwrap();
        h.set("in", SignalSlot::Value, 1.0).unwrap();
        h.initialize().unwrap();
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), 0.0);
        for n in 1..=200 {
            h.step();
            let t = n as f64 * dt;
            let y = h.get("out", SignalSlot::Value).unwrap();
            assert!((y - (1.0 - (-t / tau).exp())).abs() < 1e-4, "t = {t}: {y}");
        }
    }

    #[test]
    fn test_first_order_output_limit() {
        let mut h = Harness::of::<FirstOrderFilter>(1e-3).unwrap();
        h.set_parameter("b1", 0.01).unwrap();
        h.set_parameter("y_max", 0.25).unwrap();
        h.set_parameter("in", 1.0).unwrap();
        h.connect("out").unwrap();
        h.initialize().unwrap();
        h.run(100);
        assert_eq!(h.get("out", SignalSlot::Value).unwrap(), 0.25);
    }

    #[test]
    fn test_second_order_settles_at_dc_gain() {
        let (w, d) = (20.0, 0.7);
        let mut h = Harness::of::<SecondOrderFilter>(1e-4).unwrap();
        // 2 w^2 / (s^2 + 2 d w s + w^2)
        h.set_parameter("a0", 2.0 * w * w).unwrap();
        h.set_parameter("b0", w * w).unwrap();
        h.set_parameter("b1", 2.0 * d * w).unwrap();
        h.set_parameter("b2", 1.0).unwrap();
        h.set_parameter("in", 0.5).unwrap();
        h.connect("out").unwrap();
        h.initialize().unwrap();
        h.run(20_000);
        assert!((h.get("out", SignalSlot::Value).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_second_order_rejects_zero_denominator() {
        let mut h = Harness::of::<SecondOrderFilter>(1e-3).unwrap();
        for name in ["b0", "b1", "b2"] {
            h.set_parameter(name, 0.0).unwrap();
        }
        assert!(matches!(h.initialize(), Err(ComponentError::NonPhysical { .. })));
    }
}
