//! Comparison against reference series.

use crate::types::{Series, SeriesSet};

/// Largest mismatch of one reference series.
#[derive(Debug, Clone, PartialEq)]
pub struct Deviation {
    pub label: String,
    /// Infinite when the series is missing from the actual run.
    pub max_error: f64,
    pub time: f64,
    pub within: bool,
}

/// Linear interpolation of `values` sampled at `times`, clamped at the ends.
fn sample(times: &[f64], values: &[f64], t: f64) -> Option<f64> {
    let n = times.len().min(values.len());
    if n == 0 {
        return None;
    }
    if t <= times[0] {
        return Some(values[0]);
    }
    if t >= times[n - 1] {
        return Some(values[n - 1]);
    }
    let upper = times[..n].partition_point(|&x| x < t);
    let (t0, t1) = (times[upper - 1], times[upper]);
    let (v0, v1) = (values[upper - 1], values[upper]);
    if t1 == t0 {
        return Some(v1);
    }
    Some(v0 + (v1 - v0) * (t - t0) / (t1 - t0))
}

fn compare_one(actual: &SeriesSet, reference_times: &[f64], reference: &Series, tolerance: f64) -> Deviation {
    let label = reference.label();
    let Some(found) = actual.get(&label) else {
        return Deviation {
            label,
            max_error: f64::INFINITY,
            time: 0.0,
            within: false,
        };
    };

    let mut worst = Deviation {
        label,
        max_error: 0.0,
        time: 0.0,
        within: true,
    };
    for (&t, &expected) in reference_times.iter().zip(&reference.values) {
        let Some(value) = sample(&actual.times, &found.values, t) else {
            worst.max_error = f64::INFINITY;
            worst.within = false;
            break;
        };
        let error = (value - expected).abs();
        if error > worst.max_error || error.is_nan() {
            worst.max_error = error;
            worst.time = t;
        }
        if error.is_nan() || error > tolerance * expected.abs().max(1.0) {
            worst.within = false;
        }
    }
    worst
}

/// Check every reference series against the actual run. Values are
/// compared at the reference times with a tolerance relative to the
/// reference magnitude (absolute below 1).
pub fn compare_series(actual: &SeriesSet, reference: &SeriesSet, tolerance: f64) -> Vec<Deviation> {
    reference
        .series
        .iter()
        .map(|r| compare_one(actual, &reference.times, r, tolerance))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(times: Vec<f64>, values: Vec<f64>) -> SeriesSet {
        SeriesSet {
            times,
            series: vec![Series::new("mass", "P2", "Position", values)],
        }
    }

    #[test]
    fn identical_runs_match() {
        let a = set(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 4.0]);
        let result = compare_series(&a, &a, 1e-9);
        assert_eq!(result.len(), 1);
        assert!(result[0].within);
        assert_eq!(result[0].max_error, 0.0);
    }

    #[test]
    fn reference_on_a_coarser_grid_is_interpolated() {
        let actual = set(vec![0.0, 0.5, 1.0], vec![0.0, 0.5, 1.0]);
        let reference = set(vec![0.25, 0.75], vec![0.25, 0.75]);
        assert!(compare_series(&actual, &reference, 1e-12)[0].within);
    }

    #[test]
    fn reports_worst_point_and_missing_series() {
        let actual = set(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]);
        let reference = set(vec![0.0, 1.0, 2.0], vec![0.0, 1.2, 2.0]);
        let d = &compare_series(&actual, &reference, 0.1)[0];
        assert!(!d.within);
        assert!((d.max_error - 0.2).abs() < 1e-12);
        assert_eq!(d.time, 1.0);

        let mut other = reference.clone();
        other.series[0].component = "spring".to_string();
        let d = &compare_series(&actual, &other, 0.1)[0];
        assert!(!d.within);
        assert!(d.max_error.is_infinite());
    }
}
