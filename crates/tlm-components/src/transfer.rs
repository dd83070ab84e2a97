//! Discrete first and second order transfer functions.
//!
//! Both are discretized with the bilinear (Tustin) transform,
//! `s = 2/dt (z - 1)/(z + 1)`. Coefficients are given in ascending powers
//! of `s`: `num = [a0, a1]` and `den = [b0, b1]` describe
//! `(a1 s + a0) / (b1 s + b0)`. The output is saturated to `[min, max]` and
//! the saturated value is what the next step remembers.

use crate::error::{ComponentError, ComponentResult};

fn saturate(value: f64, min: f64, max: f64) -> (f64, bool) {
    if value >= max {
        (max, true)
    } else if value <= min {
        (min, true)
    } else {
        (value, false)
    }
}

fn check_leading(coefficient: f64) -> ComponentResult<f64> {
    if coefficient == 0.0 || !coefficient.is_finite() {
        return Err(ComponentError::NonPhysical {
            what: format!("transfer function denominator discretizes to {coefficient}"),
        });
    }
    Ok(coefficient)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FirstOrderTransferFunction {
    /// Weights of `u[n]`, `u[n-1]`.
    cu: [f64; 2],
    /// Weights of `y[n]`, `y[n-1]`.
    cy: [f64; 2],
    min: f64,
    max: f64,
    delayed_u: f64,
    delayed_y: f64,
    value: f64,
    saturated: bool,
}

impl FirstOrderTransferFunction {
    /// `u0` and `y0` are the input and output before the first update.
    pub fn new(dt: f64, num: [f64; 2], den: [f64; 2], u0: f64, y0: f64, min: f64, max: f64) -> ComponentResult<Self> {
        let cu = [num[0] * dt + 2.0 * num[1], num[0] * dt - 2.0 * num[1]];
        let cy = [check_leading(den[0] * dt + 2.0 * den[1])?, den[0] * dt - 2.0 * den[1]];
        let (y0, saturated) = saturate(y0, min, max);
        Ok(Self {
            cu,
            cy,
            min,
            max,
            delayed_u: u0,
            delayed_y: y0,
            value: y0,
            saturated,
        })
    }

    pub fn initialize_values(&mut self, u0: f64, y0: f64) {
        self.delayed_u = u0;
        self.delayed_y = y0;
        self.value = y0;
    }

    pub fn update(&mut self, u: f64) -> f64 {
        let raw = (self.cu[0] * u + self.cu[1] * self.delayed_u - self.cy[1] * self.delayed_y) / self.cy[0];
        (self.value, self.saturated) = saturate(raw, self.min, self.max);
        self.delayed_u = u;
        self.delayed_y = self.value;
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_saturated(&self) -> bool {
        self.saturated
    }
}

/// `(a2 s^2 + a1 s + a0) / (b2 s^2 + b1 s + b0)` with
/// `num = [a0, a1, a2]` and `den = [b0, b1, b2]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SecondOrderTransferFunction {
    cu: [f64; 3],
    cy: [f64; 3],
    min: f64,
    max: f64,
    delayed_u: [f64; 2],
    delayed_y: [f64; 2],
    value: f64,
    saturated: bool,
}

impl SecondOrderTransferFunction {
    pub fn new(dt: f64, num: [f64; 3], den: [f64; 3], u0: f64, y0: f64, min: f64, max: f64) -> ComponentResult<Self> {
        let weights = |c: [f64; 3]| {
            let dt2 = dt * dt;
            [
                c[0] * dt2 + 2.0 * c[1] * dt + 4.0 * c[2],
                2.0 * c[0] * dt2 - 8.0 * c[2],
                c[0] * dt2 - 2.0 * c[1] * dt + 4.0 * c[2],
            ]
        };
        let cy = weights(den);
        check_leading(cy[0])?;
        let (y0, saturated) = saturate(y0, min, max);
        Ok(Self {
            cu: weights(num),
            cy,
            min,
            max,
            delayed_u: [u0; 2],
            delayed_y: [y0; 2],
            value: y0,
            saturated,
        })
    }

    pub fn initialize_values(&mut self, u0: f64, y0: f64) {
        self.delayed_u = [u0; 2];
        self.delayed_y = [y0; 2];
        self.value = y0;
    }

    pub fn update(&mut self, u: f64) -> f64 {
        let [u1, u2] = self.delayed_u;
        let [y1, y2] = self.delayed_y;
        let raw = (self.cu[0] * u + self.cu[1] * u1 + self.cu[2] * u2 - self.cy[1] * y1 - self.cy[2] * y2) / self.cy[0];
        (self.value, self.saturated) = saturate(raw, self.min, self.max);
        self.delayed_u = [u, u1];
        self.delayed_y = [self.value, y1];
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_saturated(&self) -> bool {
        self.saturated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_LIMIT: (f64, f64) = (-1e300, 1e300);

    #[test]
    fn first_order_lag_follows_exponential() {
        let (dt, tau) = (1e-3, 0.1);
        // 1 / (tau s + 1), input already at 1 when the run starts
        let mut tf = FirstOrderTransferFunction::new(dt, [1.0, 0.0], [1.0, tau], 1.0, 0.0, NO_LIMIT.0, NO_LIMIT.1).unwrap();
        for n in 1..=1000 {
            let t = n as f64 * dt;
            let y = tf.update(1.0);
            assert!((y - (1.0 - (-t / tau).exp())).abs() < 1e-5, "t = {t}: {y}");
        }
        assert!(!tf.is_saturated());
    }

    #[test]
    fn first_order_saturates_and_remembers_limit() {
        let mut tf = FirstOrderTransferFunction::new(0.01, [1.0, 0.0], [1.0, 0.1], 1.0, 0.0, -1.0, 0.5).unwrap();
        let mut last = 0.0;
        for _ in 0..200 {
            last = tf.update(1.0);
        }
        assert_eq!(last, 0.5);
        assert!(tf.is_saturated());
        // leaving the limit starts from the clamped state
        let y = tf.update(-1.0);
        assert!(y < 0.5);
        assert!(!tf.is_saturated());
    }

    #[test]
    fn pure_gain_passes_through() {
        let mut tf = FirstOrderTransferFunction::new(0.5, [3.0, 0.0], [1.0, 0.0], 0.0, 0.0, NO_LIMIT.0, NO_LIMIT.1).unwrap();
        assert_eq!(tf.update(2.0), 6.0);
        assert_eq!(tf.value(), 6.0);
    }

    #[test]
    fn degenerate_denominator_is_refused() {
        assert!(FirstOrderTransferFunction::new(1e-3, [1.0, 0.0], [0.0, 0.0], 0.0, 0.0, -1.0, 1.0).is_err());
        assert!(SecondOrderTransferFunction::new(1e-3, [1.0, 0.0, 0.0], [0.0; 3], 0.0, 0.0, -1.0, 1.0).is_err());
    }

    #[test]
    fn second_order_matches_underdamped_step() {
        let (dt, w, d) = (1e-4, 10.0, 0.3);
        let mut tf = SecondOrderTransferFunction::new(
            dt,
            [w * w, 0.0, 0.0],
            [w * w, 2.0 * d * w, 1.0],
            1.0,
            0.0,
            NO_LIMIT.0,
            NO_LIMIT.1,
        )
        .unwrap();
        let wd = w * (1.0 - d * d).sqrt();
        let mut peak: f64 = 0.0;
        for n in 1..=20_000 {
            let t = n as f64 * dt;
            let y = tf.update(1.0);
            let exact = 1.0 - (-d * w * t).exp() * ((wd * t).cos() + d / (1.0 - d * d).sqrt() * (wd * t).sin());
            assert!((y - exact).abs() < 5e-3, "t = {t}: {y} vs {exact}");
            peak = peak.max(y);
        }
        let overshoot = (-std::f64::consts::PI * d / (1.0 - d * d).sqrt()).exp();
        assert!((peak - 1.0 - overshoot).abs() < 1e-2);
        assert!((tf.value() - 1.0).abs() < 5e-3);
    }

    #[test]
    fn second_order_reseed_holds_steady_state() {
        let mut tf = SecondOrderTransferFunction::new(1e-3, [4.0, 0.0, 0.0], [4.0, 1.0, 1.0], 0.0, 0.0, -10.0, 10.0).unwrap();
        tf.initialize_values(2.0, 2.0);
        for _ in 0..10 {
            assert!((tf.update(2.0) - 2.0).abs() < 1e-12);
        }
    }
}
