//! PI controller block.
//!
//! The control law carries output clamping, an optional integral limit and
//! conditional integration: while the output saturates the integral is
//! frozen.

use serde::{Deserialize, Serialize};
use tlm_components::{
    Component, ComponentError, ComponentResult, ComponentType, Configure, Cqs, Initialize, Input, Output,
    ParamHandle, Step,
};
use tlm_graph::{ReadRef, SlotRef};

/// PI control law, `u = kp (e + integral(e) / ti)` with `e = sp - pv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiLaw {
    pub kp: f64,
    /// Integral time constant (s).
    pub ti: f64,
    pub out_min: f64,
    pub out_max: f64,
    /// Bound on the accumulated error integral.
    pub integral_limit: Option<f64>,
}

impl PiLaw {
    pub fn new(kp: f64, ti: f64, out_min: f64, out_max: f64) -> ComponentResult<Self> {
        if ti <= 0.0 {
            return Err(ComponentError::InvalidArg {
                what: "ti must be positive",
            });
        }
        if out_min >= out_max {
            return Err(ComponentError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self {
            kp,
            ti,
            out_min,
            out_max,
            integral_limit: None,
        })
    }

    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit.abs());
        self
    }

    /// Advance the integral by one sample and return `(integral, output)`.
    pub fn update(&self, integral: f64, pv: f64, sp: f64, dt: f64) -> (f64, f64) {
        let error = sp - pv;
        let candidate = integral + error * dt;
        let candidate = match self.integral_limit {
            Some(limit) => candidate.clamp(-limit, limit),
            None => candidate,
        };

        let raw = self.kp * (error + candidate / self.ti);
        let output = raw.clamp(self.out_min, self.out_max);
        // conditional integration
        let integral = if output == raw { candidate } else { integral };
        (integral, output)
    }
}

/// Signal PI controller with a reference and a measured input.
#[derive(Debug)]
pub struct PIController {
    reference: Input,
    measured: Input,
    out: Output,
    params: [ParamHandle; 4],
    law: Option<PiLaw>,
    integral: f64,
    refs: Option<(ReadRef, ReadRef, SlotRef)>,
}

impl ComponentType for PIController {
    const TYPE_NAME: &'static str = "SignalPIController";
    const CQS: Cqs = Cqs::S;
    const DESCRIPTION: &'static str = "PI controller with anti-windup";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            reference: cfg.input_variable("ref", "Reference value", "-", 0.0),
            measured: cfg.input_variable("meas", "Measured value", "-", 0.0),
            out: cfg.output_variable("out", "Control signal"),
            params: [
                cfg.constant("Kp", "Proportional gain", "-", 1.0),
                cfg.constant("Ti", "Integral time", "s", 1.0),
                cfg.constant("u_min", "Lower output limit", "-", -1.0e300),
                cfg.constant("u_max", "Upper output limit", "-", 1.0e300),
            ],
            law: None,
            integral: 0.0,
            refs: None,
        }
    }
}

impl Component for PIController {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let [kp, ti, u_min, u_max] = self.params.map(|p| init.constant(p));
        let law = PiLaw::new(kp, ti, u_min, u_max)?;
        let refs = (
            init.input(self.reference)?,
            init.input(self.measured)?,
            init.output(self.out)?,
        );
        self.integral = 0.0;
        let error = init.get(refs.0) - init.get(refs.1);
        init.set(refs.2, (kp * error).clamp(u_min, u_max));
        self.law = Some(law);
        self.refs = Some(refs);
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let (Some(law), Some((reference, measured, out))) = (&self.law, self.refs) else {
            return;
        };
        let (integral, output) = law.update(self.integral, step.get(measured), step.get(reference), step.timestep());
        self.integral = integral;
        step.set(out, output);
    }
}
