//! Node value logging.
//!
//! The whole node arena is snapshotted at evenly strided steps. Values are
//! stored row by row, one row per logged time.

use tlm_core::num_steps;
use tlm_graph::{NodeData, SlotRef};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogSettings {
    /// Approximate number of logged samples; zero disables logging.
    pub samples: usize,
    /// Steps before this time are not logged.
    pub start_time: f64,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            samples: 2048,
            start_time: 0.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeLog {
    settings: LogSettings,
    stride: usize,
    step: usize,
    width: usize,
    times: Vec<f64>,
    rows: Vec<f64>,
}

impl NodeLog {
    pub(crate) fn new(settings: LogSettings, start: f64, stop: f64, timestep: f64, width: usize) -> Self {
        let first = settings.start_time.max(start);
        let logged_steps = num_steps(first, stop, timestep);
        let stride = if settings.samples == 0 {
            0
        } else {
            (logged_steps / settings.samples).max(1)
        };
        let capacity = if stride == 0 { 0 } else { logged_steps / stride + 1 };
        Self {
            settings,
            stride,
            step: 0,
            width,
            times: Vec::with_capacity(capacity),
            rows: Vec::with_capacity(capacity * width),
        }
    }

    fn record(&mut self, time: f64, nodes: &NodeData) {
        if self.stride == 0 || time < self.settings.start_time {
            return;
        }
        let values = nodes.values();
        if values.len() < self.width {
            return;
        }
        self.times.push(time);
        self.rows.extend_from_slice(&values[..self.width]);
    }

    /// Values after initialization, before the first step.
    pub(crate) fn initial(&mut self, time: f64, nodes: &NodeData) {
        self.step = 0;
        self.record(time, nodes);
    }

    pub(crate) fn after_step(&mut self, time: f64, nodes: &NodeData) {
        self.step += 1;
        if self.stride != 0 && self.step % self.stride == 0 {
            self.record(time, nodes);
        }
    }

    pub fn settings(&self) -> LogSettings {
        self.settings
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Logged values of one slot.
    pub fn series(&self, slot: SlotRef) -> Vec<f64> {
        if slot.index() >= self.width {
            return Vec::new();
        }
        self.rows
            .chunks_exact(self.width)
            .map(|row| row[slot.index()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlm_graph::{NodeType, NodeTypeRegistry, SignalSlot};

    fn one_signal() -> (NodeData, SlotRef) {
        let registry = NodeTypeRegistry::new();
        let mut nodes = NodeData::new();
        let node = nodes.add_node(NodeType::Signal, registry.descriptions(NodeType::Signal));
        let slot = nodes.slot(node, SignalSlot::Value).unwrap();
        (nodes, slot)
    }

    #[test]
    fn strided_samples() {
        let (mut nodes, slot) = one_signal();
        let settings = LogSettings {
            samples: 5,
            start_time: 0.0,
        };
        let mut log = NodeLog::new(settings, 0.0, 1.0, 0.1, nodes.len());
        log.initial(0.0, &nodes);
        for k in 1..=10 {
            nodes.set(slot, k as f64);
            log.after_step(k as f64 * 0.1, &nodes);
        }
        assert_eq!(log.len(), 6);
        assert_eq!(log.series(slot), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn start_time_skips_early_steps() {
        let (mut nodes, slot) = one_signal();
        let settings = LogSettings {
            samples: 100,
            start_time: 0.45,
        };
        let mut log = NodeLog::new(settings, 0.0, 1.0, 0.1, nodes.len());
        log.initial(0.0, &nodes);
        for k in 1..=10 {
            nodes.set(slot, k as f64);
            log.after_step(k as f64 * 0.1, &nodes);
        }
        assert_eq!(log.series(slot), vec![5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn zero_samples_disables_logging() {
        let (nodes, _) = one_signal();
        let settings = LogSettings {
            samples: 0,
            start_time: 0.0,
        };
        let mut log = NodeLog::new(settings, 0.0, 1.0, 0.1, nodes.len());
        log.initial(0.0, &nodes);
        log.after_step(0.1, &nodes);
        assert!(log.is_empty());
    }
}
