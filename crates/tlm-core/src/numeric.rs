use crate::TlmError;

/// Floating point type used throughout the kernel.
pub type Real = f64;

#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &str) -> Result<Real, TlmError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TlmError::NonFinite {
            what: what.to_string(),
            value: v,
        })
    }
}

/// Number of steps of length `dt` between `from` and `to`, rounded to the
/// nearest integer. Never negative; zero for a non-positive `dt`.
pub fn num_steps(from: Real, to: Real, dt: Real) -> usize {
    if dt <= 0.0 || !dt.is_finite() {
        return 0;
    }
    let n = ((to - from) / dt).round();
    if n.is_finite() && n > 0.0 {
        n as usize
    } else {
        0
    }
}

/// `outer / inner` as an integer, if it is one within tolerance.
pub fn integer_ratio(outer: Real, inner: Real) -> Result<usize, TlmError> {
    if inner <= 0.0 || outer <= 0.0 {
        return Err(TlmError::TimestepRatio { outer, inner });
    }
    let ratio = outer / inner;
    let rounded = ratio.round();
    if rounded >= 1.0 && nearly_equal(ratio, rounded, Tolerances::default()) {
        Ok(rounded as usize)
    } else {
        Err(TlmError::TimestepRatio { outer, inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "mass").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
        assert!(msg.contains("mass"));
    }

    #[test]
    fn num_steps_rounds_and_clamps() {
        assert_eq!(num_steps(0.0, 1.0, 0.1), 10);
        assert_eq!(num_steps(0.0, 0.0999, 0.1), 1);
        assert_eq!(num_steps(0.0, 0.04, 0.1), 0);
        assert_eq!(num_steps(1.0, 0.0, 0.1), 0);
        assert_eq!(num_steps(0.0, 1.0, 0.0), 0);
    }

    #[test]
    fn integer_ratio_accepts_divisors_only() {
        assert_eq!(integer_ratio(1e-3, 2.5e-4).unwrap(), 4);
        assert_eq!(integer_ratio(0.1, 0.1).unwrap(), 1);
        assert!(integer_ratio(1e-3, 3e-4).is_err());
        assert!(integer_ratio(1e-3, 2e-3).is_err());
        assert!(integer_ratio(1e-3, 0.0).is_err());
    }
}
