//! Sample-and-hold.
//!
//! Between samples the output is held constant (zero-order hold).

use serde::{Deserialize, Serialize};
use tlm_components::{
    Component, ComponentError, ComponentResult, ComponentType, Configure, Cqs, Initialize, Input, Output,
    ParamHandle, Step,
};
use tlm_graph::{ReadRef, SlotRef};

/// Tracks when the next sample is due.
///
/// `tolerance` absorbs the rounding of accumulated simulation time; a
/// sample is due once `time + tolerance >= next_sample_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleClock {
    pub period: f64,
    pub next_sample_time: f64,
    pub tolerance: f64,
}

impl SampleClock {
    pub fn new(period: f64, initial_time: f64, tolerance: f64) -> ComponentResult<Self> {
        if period <= 0.0 {
            return Err(ComponentError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self {
            period,
            next_sample_time: initial_time + period,
            tolerance,
        })
    }

    pub fn should_sample(&self, time: f64) -> bool {
        time + self.tolerance >= self.next_sample_time
    }

    pub fn advance(&mut self) {
        self.next_sample_time += self.period;
    }

    pub fn time_until_sample(&self, time: f64) -> f64 {
        (self.next_sample_time - time).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroOrderHold {
    pub value: f64,
    pub clock: SampleClock,
}

impl ZeroOrderHold {
    pub fn new(clock: SampleClock, initial_value: f64) -> Self {
        Self {
            value: initial_value,
            clock,
        }
    }

    pub fn get(&self) -> f64 {
        self.value
    }

    /// Take `value` if a sample is due. Returns whether it was taken.
    pub fn update(&mut self, time: f64, value: f64) -> bool {
        if self.clock.should_sample(time) {
            self.value = value;
            self.clock.advance();
            true
        } else {
            false
        }
    }
}

/// Samples its input every `Ts` seconds and holds it in between.
#[derive(Debug)]
pub struct SampleHold {
    input: Input,
    out: Output,
    period: ParamHandle,
    hold: Option<ZeroOrderHold>,
    refs: Option<(ReadRef, SlotRef)>,
}

impl ComponentType for SampleHold {
    const TYPE_NAME: &'static str = "SignalSampleAndHold";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "Sample and hold";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            input: cfg.input_variable("in", "Sampled input", "-", 0.0),
            out: cfg.output_variable("out", "Held value"),
            period: cfg.constant("Ts", "Sample period", "s", 0.1),
            hold: None,
            refs: None,
        }
    }
}

impl Component for SampleHold {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let clock = SampleClock::new(init.constant(self.period), init.time(), 0.5 * init.timestep())?;
        if clock.period < init.timestep() {
            init.warning("sample period is shorter than the timestep, sampling every step");
        }
        let input = init.input(self.input)?;
        let out = init.output(self.out)?;
        let hold = ZeroOrderHold::new(clock, init.get(input));
        init.set(out, hold.get());
        self.hold = Some(hold);
        self.refs = Some((input, out));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let (Some(hold), Some((input, out))) = (&mut self.hold, self.refs) else {
            return;
        };
        hold.update(step.time(), step.get(input));
        step.set(out, hold.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlm_components::harness::Harness;
    use tlm_graph::SignalSlot;

    #[test]
    fn test_clock_rejects_non_positive_period() {
        assert!(SampleClock::new(0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_clock_tolerates_rounding() {
        let clock = SampleClock::new(0.1, 0.0, 1e-6).unwrap();
        assert!(!clock.should_sample(0.05));
        assert!(clock.should_sample(0.099_999_999_9));
        assert!((clock.time_until_sample(0.04) - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_hold_between_samples() {
        let mut h = Harness::of::<SampleHold>(0.01).unwrap();
        h.set_parameter("Ts", 0.05).unwrap();
        h.connect("in").unwrap();
        h.connect("out").unwrap();
        h.set("in", SignalSlot::Value, 1.0).unwrap();
        h.initialize().unwrap();

        let mut outputs = Vec::new();
        for n in 1..=10 {
            h.set("in", SignalSlot::Value, n as f64).unwrap();
            h.step();
            outputs.push(h.get("out", SignalSlot::Value).unwrap());
        }
        assert_eq!(outputs, vec![1.0, 1.0, 1.0, 1.0, 5.0, 5.0, 5.0, 5.0, 5.0, 10.0]);
    }
}
