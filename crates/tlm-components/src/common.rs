//! Small numeric helpers shared by component models.

use crate::error::{ComponentError, ComponentResult};
use tlm_core::numeric::ensure_finite;

/// Smallest determinant treated as solvable by Q-type element equations.
pub const EPSILON_DET: f64 = 1e-300;

pub fn check_finite(value: f64, what: &str) -> ComponentResult<f64> {
    ensure_finite(value, what).map_err(|_| ComponentError::NonPhysical {
        what: format!("{what} = {value}"),
    })
}

/// Clamp into `[min, max]`; `min` wins if the bounds are inverted.
pub fn limit(value: f64, min: f64, max: f64) -> f64 {
    if value > max {
        max.max(min)
    } else if value < min {
        min
    } else {
        value
    }
}

/// +1 for non-negative input, -1 otherwise.
pub fn sign(value: f64) -> f64 {
    if value >= 0.0 { 1.0 } else { -1.0 }
}

/// Trapezoidal update of an integrated quantity.
#[inline]
pub fn trapezoid(previous: f64, rate_old: f64, rate_new: f64, dt: f64) -> f64 {
    previous + 0.5 * dt * (rate_old + rate_new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit() {
        assert_eq!(limit(5.0, 0.0, 10.0), 5.0);
        assert_eq!(limit(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(limit(11.0, 0.0, 10.0), 10.0);
        assert_eq!(limit(3.0, 2.0, 1.0), 2.0);
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(0.0), 1.0);
        assert_eq!(sign(-1e-9), -1.0);
    }

    #[test]
    fn test_check_finite() {
        assert!(check_finite(1.0, "test").is_ok());
        assert!(check_finite(f64::INFINITY, "test").is_err());
        assert!(check_finite(f64::NAN, "test").is_err());
    }

    #[test]
    fn test_trapezoid() {
        assert_eq!(trapezoid(1.0, 2.0, 4.0, 0.5), 2.5);
    }
}
