//! Signal sources.

use std::f64::consts::PI;

use tlm_components::{
    Component, ComponentResult, ComponentType, Configure, Cqs, Initialize, Output, ParamHandle, Step,
};
use tlm_graph::SlotRef;

/// Constant output.
#[derive(Debug)]
pub struct Constant {
    value: ParamHandle,
    out: Output,
    state: Option<(SlotRef, f64)>,
}

impl ComponentType for Constant {
    const TYPE_NAME: &'static str = "SignalConstant";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "Constant signal";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            value: cfg.constant("y", "Constant value", "-", 1.0),
            out: cfg.output_variable("out", "Constant output"),
            state: None,
        }
    }
}

impl Component for Constant {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let out = init.output(self.out)?;
        let value = init.constant(self.value);
        init.set(out, value);
        self.state = Some((out, value));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        if let Some((out, value)) = self.state {
            step.set(out, value);
        }
    }
}

/// Step from `y_0` to `y_0 + y_A` at `t_step`.
#[derive(Debug)]
pub struct StepSignal {
    params: [ParamHandle; 3],
    out: Output,
    levels: (f64, f64, f64),
    slot: Option<SlotRef>,
}

impl StepSignal {
    fn value(&self, time: f64) -> f64 {
        let (y0, amplitude, t_step) = self.levels;
        if time < t_step { y0 } else { y0 + amplitude }
    }
}

impl ComponentType for StepSignal {
    const TYPE_NAME: &'static str = "SignalStep";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "Step";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            params: [
                cfg.constant("y_0", "Base value", "-", 0.0),
                cfg.constant("y_A", "Step height", "-", 1.0),
                cfg.constant("t_step", "Step time", "s", 1.0),
            ],
            out: cfg.output_variable("out", "Step output"),
            levels: (0.0, 0.0, 0.0),
            slot: None,
        }
    }
}

impl Component for StepSignal {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let [y0, amplitude, t_step] = self.params.map(|p| init.constant(p));
        self.levels = (y0, amplitude, t_step);
        let out = init.output(self.out)?;
        init.set(out, self.value(init.time()));
        self.slot = Some(out);
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        if let Some(out) = self.slot {
            step.set(out, self.value(step.time()));
        }
    }
}

/// `y_offset + a sin(2 pi f (t - t_delay))`, holding `y_offset` before
/// `t_delay`.
#[derive(Debug)]
pub struct Sine {
    params: [ParamHandle; 4],
    out: Output,
    wave: [f64; 4],
    slot: Option<SlotRef>,
}

impl Sine {
    fn value(&self, time: f64) -> f64 {
        let [frequency, amplitude, offset, delay] = self.wave;
        if time < delay {
            offset
        } else {
            offset + amplitude * (2.0 * PI * frequency * (time - delay)).sin()
        }
    }
}

impl ComponentType for Sine {
    const TYPE_NAME: &'static str = "SignalSineWave";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "Sine wave";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            params: [
                cfg.constant("f", "Frequency", "Hz", 1.0),
                cfg.constant("a", "Amplitude", "-", 1.0),
                cfg.constant("y_offset", "Offset", "-", 0.0),
                cfg.constant("t_delay", "Start time", "s", 0.0),
            ],
            out: cfg.output_variable("out", "Sine output"),
            wave: [0.0; 4],
            slot: None,
        }
    }
}

impl Component for Sine {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        self.wave = self.params.map(|p| init.constant(p));
        let out = init.output(self.out)?;
        init.set(out, self.value(init.time()));
        self.slot = Some(out);
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        if let Some(out) = self.slot {
            step.set(out, self.value(step.time()));
        }
    }
}

/// Simulation time as a signal.
#[derive(Debug)]
pub struct Time {
    out: Output,
    slot: Option<SlotRef>,
}

impl ComponentType for Time {
    const TYPE_NAME: &'static str = "SignalTime";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "Simulation time";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            out: cfg.output_variable("out", "Time"),
            slot: None,
        }
    }
}

impl Component for Time {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let out = init.output(self.out)?;
        init.set(out, init.time());
        self.slot = Some(out);
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        if let Some(out) = self.slot {
            step.set(out, step.time());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlm_components::harness::Harness;
    use tlm_graph::SignalSlot;

    fn out(h: &Harness) -> f64 {
        h.get("out", SignalSlot::Value).unwrap()
    }

    #[test]
    fn test_constant() {
        let mut h = Harness::of::<Constant>(0.1).unwrap();
        h.set_parameter("y", 4.5).unwrap();
        h.connect("out").unwrap();
        h.initialize().unwrap();
        h.run(3);
        assert_eq!(out(&h), 4.5);
    }

    #[test]
    fn test_step_switches_at_step_time() {
        let mut h = Harness::of::<StepSignal>(0.25).unwrap();
        h.set_parameter("y_0", 1.0).unwrap();
        h.set_parameter("y_A", 2.0).unwrap();
        h.set_parameter("t_step", 0.5).unwrap();
        h.connect("out").unwrap();
        h.initialize().unwrap();
        assert_eq!(out(&h), 1.0);
        h.step();
        assert_eq!(out(&h), 1.0);
        h.step();
        assert_eq!(out(&h), 3.0);
    }

    #[test]
    fn test_sine_quarter_period() {
        let mut h = Harness::of::<Sine>(0.25).unwrap();
        h.set_parameter("a", 2.0).unwrap();
        h.set_parameter("y_offset", 1.0).unwrap();
        h.connect("out").unwrap();
        h.initialize().unwrap();
        assert_eq!(out(&h), 1.0);
        h.step();
        assert!((out(&h) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_time_follows_clock() {
        let mut h = Harness::of::<Time>(0.5).unwrap();
        h.connect("out").unwrap();
        h.initialize().unwrap();
        h.run(4);
        assert_eq!(out(&h), 2.0);
    }
}
