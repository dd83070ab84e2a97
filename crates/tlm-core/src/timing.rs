//! Opt-in wall clock timing of kernel phases.
//!
//! Off unless a driver calls [`enable_timing`] or `TLM_TIMING` is set in the
//! environment. A disabled timer never reads the clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static ENABLED: AtomicBool = AtomicBool::new(false);

pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var_os("TLM_TIMING").is_some()
}

/// Measures one phase (`initialize`, one `simulate` call, ...).
#[derive(Debug)]
pub struct Timer {
    phase: &'static str,
    started: Option<Instant>,
}

impl Timer {
    pub fn start(phase: &'static str) -> Self {
        Self {
            phase,
            started: is_enabled().then(Instant::now),
        }
    }

    /// Elapsed seconds, `None` while timing is off.
    pub fn stop(self) -> Option<f64> {
        Some(self.started?.elapsed().as_secs_f64())
    }

    /// Stop and add the measurement to `clock`.
    pub fn stop_into(self, clock: &mut PhaseClock) {
        let phase = self.phase;
        if let Some(elapsed) = self.stop() {
            tracing::debug!(target: "tlm::timing", phase, elapsed_s = elapsed);
            clock.add(elapsed);
        }
    }
}

/// Wall time summed over repeated calls of one phase of one run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhaseClock {
    total: Duration,
    calls: u32,
}

impl PhaseClock {
    pub fn add(&mut self, seconds: f64) {
        self.total += Duration::from_secs_f64(seconds.max(0.0));
        self.calls += 1;
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }

    pub fn total_seconds(&self) -> f64 {
        self.total.as_secs_f64()
    }

    /// `None` before the first measured call.
    pub fn measured(&self) -> Option<f64> {
        (self.calls > 0).then(|| self.total_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_sums_calls() {
        let mut clock = PhaseClock::default();
        assert_eq!(clock.measured(), None);
        clock.add(0.25);
        clock.add(0.5);
        assert_eq!(clock.calls(), 2);
        assert!((clock.total_seconds() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn disabled_timer_measures_nothing() {
        disable_timing();
        if std::env::var_os("TLM_TIMING").is_none() {
            let mut clock = PhaseClock::default();
            Timer::start("simulate").stop_into(&mut clock);
            assert_eq!(clock.measured(), None);
        }
    }
}
