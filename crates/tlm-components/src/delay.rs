//! Fixed-length delay line.

use crate::error::{ComponentError, ComponentResult};

/// Longest delay a line may buffer, in steps.
pub const MAX_DELAY_STEPS: usize = 10_000_000;

/// Returns each value pushed exactly `steps` updates later. A zero-step
/// delay passes values straight through.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Delay {
    buffer: Vec<f64>,
    pos: usize,
}

impl Delay {
    /// Fails for more than [`MAX_DELAY_STEPS`] steps.
    pub fn new(steps: usize, initial: f64) -> ComponentResult<Self> {
        if steps > MAX_DELAY_STEPS {
            return Err(ComponentError::NonPhysical {
                what: format!("delay of {steps} steps exceeds the limit of {MAX_DELAY_STEPS}"),
            });
        }
        Ok(Self {
            buffer: vec![initial; steps],
            pos: 0,
        })
    }

    pub fn steps(&self) -> usize {
        self.buffer.len()
    }

    /// Push `value` and return the value pushed `steps` updates ago.
    #[inline]
    pub fn update(&mut self, value: f64) -> f64 {
        if self.buffer.is_empty() {
            return value;
        }
        let out = std::mem::replace(&mut self.buffer[self.pos], value);
        self.pos = (self.pos + 1) % self.buffer.len();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_by_exact_step_count() {
        let mut delay = Delay::new(3, -1.0).unwrap();
        let out: Vec<f64> = (0..6).map(|i| delay.update(i as f64)).collect();
        assert_eq!(out, vec![-1.0, -1.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(delay.update(0.0), 3.0);
    }

    #[test]
    fn zero_steps_pass_through() {
        let mut delay = Delay::new(0, 7.0).unwrap();
        assert_eq!(delay.steps(), 0);
        assert_eq!(delay.update(4.0), 4.0);
    }

    #[test]
    fn overlong_delay_is_refused() {
        assert!(matches!(
            Delay::new(MAX_DELAY_STEPS + 1, 0.0),
            Err(ComponentError::NonPhysical { .. })
        ));
    }
}
