//! Run a single component outside a system.
//!
//! The harness owns a node arena, gives ports fresh nodes on request and
//! lets a test drive the component one step at a time.
//!
//! ```
//! use tlm_components::harness::Harness;
//! use tlm_components::mechanic::PositionSensor;
//! use tlm_graph::{MechanicSlot, SignalSlot};
//!
//! let mut h = Harness::of::<PositionSensor>(1e-3).unwrap();
//! h.connect("P1").unwrap();
//! h.connect("out").unwrap();
//! h.set("P1", MechanicSlot::Position, 3.14).unwrap();
//! h.initialize().unwrap();
//! assert_eq!(h.get("out", SignalSlot::Value).unwrap(), 3.14);
//! ```

use std::collections::HashMap;

use tlm_core::{MessageHandler, NodeId};
use tlm_graph::{NodeData, NodeSlot, NodeTypeRegistry, PortBinding, SlotRef};

use crate::context::{Clock, StopFlag};
use crate::error::{ComponentError, ComponentResult};
use crate::instance::ComponentInstance;
use crate::traits::ComponentType;

pub struct Harness {
    registry: NodeTypeRegistry,
    nodes: NodeData,
    instance: ComponentInstance,
    bindings: Vec<PortBinding>,
    clock: Clock,
    steps: u64,
    messages: MessageHandler,
    stop: StopFlag,
}

impl Harness {
    pub fn new(instance: ComponentInstance, timestep: f64) -> Self {
        let bindings = vec![PortBinding::Unconnected; instance.ports().len()];
        Self {
            registry: NodeTypeRegistry::new(),
            nodes: NodeData::new(),
            instance,
            bindings,
            clock: Clock { time: 0.0, timestep },
            steps: 0,
            messages: MessageHandler::new(),
            stop: StopFlag::default(),
        }
    }

    pub fn of<T: ComponentType>(timestep: f64) -> ComponentResult<Self> {
        Ok(Self::new(ComponentInstance::of::<T>(T::TYPE_NAME)?, timestep))
    }

    /// Bind `port` to a new node; multi-ports gain one sub-port per call.
    pub fn connect(&mut self, port: &str) -> ComponentResult<NodeId> {
        let index = self.instance.port_index(port)?;
        let node_type = self.instance.ports()[index]
            .node_type
            .ok_or(ComponentError::InvalidArg {
                what: "port has no node type",
            })?;
        let node = self
            .nodes
            .add_node(node_type, self.registry.descriptions(node_type));
        self.connect_to(port, node)?;
        Ok(node)
    }

    /// Bind `port` to an existing node.
    pub fn connect_to(&mut self, port: &str, node: NodeId) -> ComponentResult<()> {
        let index = self.instance.port_index(port)?;
        let multi = self.instance.ports()[index].kind.is_multi();
        let binding = &mut self.bindings[index];
        *binding = match std::mem::take(binding) {
            PortBinding::Multi(mut nodes) => {
                nodes.push(node);
                PortBinding::Multi(nodes)
            }
            PortBinding::Unconnected if multi => PortBinding::Multi(vec![node]),
            _ => PortBinding::Single(node),
        };
        Ok(())
    }

    pub fn sub_node(&self, port: &str, sub: usize) -> ComponentResult<NodeId> {
        let index = self.instance.port_index(port)?;
        self.bindings[index]
            .nodes()
            .get(sub)
            .copied()
            .ok_or_else(|| ComponentError::Unconnected {
                component: self.instance.name().to_string(),
                port: format!("{port}[{sub}]"),
            })
    }

    pub fn node(&self, port: &str) -> ComponentResult<NodeId> {
        self.sub_node(port, 0)
    }

    pub fn slot_ref<S: NodeSlot>(&self, port: &str, sub: usize, slot: S) -> ComponentResult<SlotRef> {
        Ok(self.nodes.slot(self.sub_node(port, sub)?, slot)?)
    }

    pub fn set<S: NodeSlot>(&mut self, port: &str, slot: S, value: f64) -> ComponentResult<()> {
        self.set_sub(port, 0, slot, value)
    }

    pub fn set_sub<S: NodeSlot>(&mut self, port: &str, sub: usize, slot: S, value: f64) -> ComponentResult<()> {
        let slot = self.slot_ref(port, sub, slot)?;
        self.nodes.set(slot, value);
        Ok(())
    }

    pub fn get<S: NodeSlot>(&self, port: &str, slot: S) -> ComponentResult<f64> {
        self.get_sub(port, 0, slot)
    }

    pub fn get_sub<S: NodeSlot>(&self, port: &str, sub: usize, slot: S) -> ComponentResult<f64> {
        Ok(self.nodes.get(self.slot_ref(port, sub, slot)?))
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> ComponentResult<()> {
        self.instance.set_parameter_value(name, value)
    }

    pub fn initialize(&mut self) -> ComponentResult<()> {
        self.stop.clear();
        self.steps = 0;
        self.clock.time = 0.0;
        self.instance.bind(self.bindings.clone());
        let mut written = HashMap::new();
        self.instance
            .load_start_values(&mut self.nodes, &mut written, &self.messages)?;
        self.instance
            .initialize(&mut self.nodes, self.clock, &self.messages, &mut self.stop)
    }

    pub fn step(&mut self) {
        self.steps += 1;
        self.clock.time = self.steps as f64 * self.clock.timestep;
        self.instance
            .simulate_one_timestep(&mut self.nodes, self.clock, &self.messages, &mut self.stop);
    }

    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            if self.stop.is_requested() {
                break;
            }
            self.step();
        }
    }

    pub fn finalize(&mut self) {
        self.instance.finalize();
    }

    pub fn time(&self) -> f64 {
        self.clock.time
    }

    pub fn messages(&self) -> &MessageHandler {
        &self.messages
    }

    pub fn stop_reason(&self) -> Option<&str> {
        self.stop.reason()
    }

    pub fn instance(&self) -> &ComponentInstance {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut ComponentInstance {
        &mut self.instance
    }

    pub fn nodes(&self) -> &NodeData {
        &self.nodes
    }
}
