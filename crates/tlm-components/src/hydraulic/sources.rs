use tlm_graph::{Cqs, NodeType, ReadRef};

use super::HydraulicNode;
use crate::context::{Configure, Initialize, Input, PowerPort, Step};
use crate::error::ComponentResult;
use crate::traits::{Component, ComponentType};

/// Ideal pressure source, e.g. a tank (C side, zero impedance).
#[derive(Debug)]
pub struct PressureSource {
    p1: PowerPort,
    pressure: Input,
    nodes: Option<(HydraulicNode, ReadRef)>,
}

impl ComponentType for PressureSource {
    const TYPE_NAME: &'static str = "HydraulicPressureSource";
    const CQS: Cqs = Cqs::C;
    const DESCRIPTION: &'static str = "Ideal pressure source";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            p1: cfg.power_port("P1", NodeType::Hydraulic),
            pressure: cfg.input_variable("p", "Set pressure", "Pa", 1.0e5),
            nodes: None,
        }
    }
}

impl Component for PressureSource {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let p1 = HydraulicNode::resolve(init, self.p1)?;
        let pressure = init.input(self.pressure)?;
        let value = init.get(pressure);
        init.set(p1.c, value);
        init.set(p1.zc, 0.0);
        self.nodes = Some((p1, pressure));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((p1, pressure)) = self.nodes else { return };
        let value = step.get(pressure);
        step.set(p1.c, value);
        step.set(p1.zc, 0.0);
    }
}

/// Ideal flow source (Q side).
#[derive(Debug)]
pub struct FlowSource {
    p1: PowerPort,
    flow: Input,
    nodes: Option<(HydraulicNode, ReadRef)>,
}

impl ComponentType for FlowSource {
    const TYPE_NAME: &'static str = "HydraulicFlowSource";
    const CQS: Cqs = Cqs::Q;
    const DESCRIPTION: &'static str = "Ideal flow source";

    fn configure(cfg: &mut Configure<'_>) -> Self {
        Self {
            p1: cfg.power_port("P1", NodeType::Hydraulic),
            flow: cfg.input_variable("q", "Flow", "m^3/s", 1.0e-3),
            nodes: None,
        }
    }
}

impl Component for FlowSource {
    fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
        let p1 = HydraulicNode::resolve(init, self.p1)?;
        let flow = init.input(self.flow)?;
        let q = init.get(flow);
        init.set(p1.q, q);
        self.nodes = Some((p1, flow));
        Ok(())
    }

    fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
        let Some((p1, flow)) = self.nodes else { return };
        let q = step.get(flow);
        let p = step.get(p1.c) + step.get(p1.zc) * q;
        step.set(p1.q, q);
        step.set(p1.p, p);
    }
}
