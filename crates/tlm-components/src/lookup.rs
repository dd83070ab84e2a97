//! One-dimensional lookup table.

use crate::error::{ComponentError, ComponentResult};

/// Piecewise linear table over a strictly increasing index. Inputs outside
/// the index range are clamped to the first or last value. NaN maps to NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct LookupTable1D {
    index: Vec<f64>,
    values: Vec<f64>,
}

impl LookupTable1D {
    pub fn new(index: Vec<f64>, values: Vec<f64>) -> ComponentResult<Self> {
        if index.is_empty() || index.len() != values.len() {
            return Err(ComponentError::InvalidArg {
                what: "lookup table needs equally long, non-empty index and value columns",
            });
        }
        if !index.windows(2).all(|w| w[0] < w[1]) || index.iter().chain(&values).any(|v| !v.is_finite()) {
            return Err(ComponentError::InvalidArg {
                what: "lookup table index must be finite and strictly increasing",
            });
        }
        Ok(Self { index, values })
    }

    /// Build from `(index, value)` rows.
    pub fn from_rows(rows: &[(f64, f64)]) -> ComponentResult<Self> {
        let (index, values) = rows.iter().copied().unzip();
        Self::new(index, values)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn interpolate(&self, x: f64) -> f64 {
        let last = self.index.len() - 1;
        if x.is_nan() {
            return f64::NAN;
        }
        if x < self.index[0] {
            return self.values[0];
        }
        if x >= self.index[last] {
            return self.values[last];
        }
        // first breakpoint above x; 1..=last because of the checks above
        let hi = self.index.partition_point(|&i| i <= x);
        let lo = hi - 1;
        let (x0, x1) = (self.index[lo], self.index[hi]);
        let (y0, y1) = (self.values[lo], self.values[hi]);
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }
}
