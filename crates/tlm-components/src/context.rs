//! The views a component model gets of the framework.
//!
//! - [`Configure`] while the model is built: declare ports and parameters.
//! - [`Initialize`] at the start of a run: turn ports into slot handles.
//! - [`Step`] every timestep: read and write through those handles.
//!
//! Port handles are typed by direction. Only [`PowerPort`] and
//! [`WritePort`] yield writable [`SlotRef`]s; read ports yield
//! [`ReadRef`]s, which [`Step::set`] does not accept.

use tlm_core::MessageHandler;
use tlm_graph::{
    NodeData, NodeSlot, NodeType, PortBinding, PortDecl, ReadRef, Requirement, SignalSlot,
    SlotRef,
};

use crate::error::{ComponentError, ComponentResult};
use crate::parameters::{ParamHandle, Parameters};

/// Any port handle.
pub trait PortRef: Copy {
    fn port_index(self) -> usize;
}

/// Port handles whose slots may be written.
pub trait Writable: PortRef {}

/// Multi-port handles.
pub trait MultiPortRef: PortRef {}

macro_rules! port_handles {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
            pub struct $name(usize);

            impl PortRef for $name {
                #[inline]
                fn port_index(self) -> usize {
                    self.0
                }
            }
        )+
    };
}

port_handles! {
    PowerPort,
    ReadPort,
    WritePort,
    PowerMultiPort,
    ReadMultiPort,
}

impl Writable for PowerPort {}
impl Writable for WritePort {}
impl MultiPortRef for PowerMultiPort {}
impl MultiPortRef for ReadMultiPort {}

/// Signal input that falls back to a parameter value when unconnected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Input {
    pub port: ReadPort,
    pub param: ParamHandle,
}

/// Optional signal output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Output(pub WritePort);

/// Simulation time seen by a component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clock {
    pub time: f64,
    pub timestep: f64,
}

/// Request to end the run at the next step boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StopFlag {
    reason: Option<String>,
}

impl StopFlag {
    /// Keeps the first reason when requested repeatedly.
    pub fn request(&mut self, reason: impl Into<String>) {
        if self.reason.is_none() {
            self.reason = Some(reason.into());
        }
    }

    pub fn is_requested(&self) -> bool {
        self.reason.is_some()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn clear(&mut self) {
        self.reason = None;
    }
}

/// One writable slot per connected sub-port, in connection order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiSlots {
    refs: Vec<SlotRef>,
}

/// One readable slot per connected sub-port, in connection order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiRead {
    refs: Vec<ReadRef>,
}

/// Uniform traversal over the sub-ports of a multi-port.
pub trait SubPorts {
    fn len(&self) -> usize;

    fn read_ref(&self, index: usize) -> Option<ReadRef>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MultiSlots {
    pub fn iter(&self) -> impl Iterator<Item = SlotRef> + '_ {
        self.refs.iter().copied()
    }

    pub fn get(&self, index: usize) -> Option<SlotRef> {
        self.refs.get(index).copied()
    }
}

impl MultiRead {
    pub fn iter(&self) -> impl Iterator<Item = ReadRef> + '_ {
        self.refs.iter().copied()
    }
}

impl SubPorts for MultiSlots {
    fn len(&self) -> usize {
        self.refs.len()
    }

    fn read_ref(&self, index: usize) -> Option<ReadRef> {
        self.refs.get(index).map(|r| r.read_only())
    }
}

impl SubPorts for MultiRead {
    fn len(&self) -> usize {
        self.refs.len()
    }

    fn read_ref(&self, index: usize) -> Option<ReadRef> {
        self.refs.get(index).copied()
    }
}

/// Declaration view used while a model is built.
pub struct Configure<'a> {
    pub(crate) ports: &'a mut Vec<PortDecl>,
    pub(crate) params: &'a mut Parameters,
}

impl<'a> Configure<'a> {
    fn push(&mut self, decl: PortDecl) -> usize {
        self.ports.push(decl);
        self.ports.len() - 1
    }

    pub fn power_port(&mut self, name: &str, node_type: NodeType) -> PowerPort {
        PowerPort(self.push(PortDecl::power(name, node_type)))
    }

    /// Power port that may be left unconnected.
    pub fn optional_power_port(&mut self, name: &str, node_type: NodeType) -> PowerPort {
        PowerPort(self.push(
            PortDecl::power(name, node_type).with_requirement(Requirement::NotRequired),
        ))
    }

    pub fn power_multi_port(&mut self, name: &str, node_type: NodeType) -> PowerMultiPort {
        PowerMultiPort(self.push(PortDecl::power_multi(name, node_type)))
    }

    pub fn read_port(&mut self, name: &str, node_type: NodeType, requirement: Requirement) -> ReadPort {
        ReadPort(self.push(PortDecl::read(name, node_type, requirement)))
    }

    pub fn read_multi_port(
        &mut self,
        name: &str,
        node_type: NodeType,
        requirement: Requirement,
    ) -> ReadMultiPort {
        ReadMultiPort(self.push(PortDecl::read_multi(name, node_type, requirement)))
    }

    pub fn write_port(&mut self, name: &str, node_type: NodeType, requirement: Requirement) -> WritePort {
        WritePort(self.push(PortDecl::write(name, node_type, requirement)))
    }

    /// Read port with a custom declaration, e.g. a non-default sort hint.
    pub fn read_port_decl(&mut self, decl: PortDecl) -> ReadPort {
        ReadPort(self.push(decl))
    }

    /// Plain parameter, read once at initialization.
    pub fn constant(&mut self, name: &str, description: &str, unit: &str, default: f64) -> ParamHandle {
        self.params.add(name, description, unit, default)
    }

    /// Optional signal read port backed by a parameter of the same name.
    pub fn input_variable(&mut self, name: &str, description: &str, unit: &str, default: f64) -> Input {
        let param = self.params.add(name, description, unit, default);
        let port = self.read_port_decl(
            PortDecl::read(name, NodeType::Signal, Requirement::NotRequired)
                .with_description(description),
        );
        Input { port, param }
    }

    /// Optional signal write port.
    pub fn output_variable(&mut self, name: &str, description: &str) -> Output {
        Output(WritePort(self.push(
            PortDecl::write(name, NodeType::Signal, Requirement::NotRequired)
                .with_description(description),
        )))
    }
}

/// Initialization view: resolve slot handles and seed state.
pub struct Initialize<'a> {
    pub(crate) nodes: &'a mut NodeData,
    pub(crate) ports: &'a [PortDecl],
    pub(crate) bindings: &'a [PortBinding],
    pub(crate) params: &'a Parameters,
    pub(crate) name: &'a str,
    pub(crate) clock: Clock,
    pub(crate) messages: &'a MessageHandler,
    pub(crate) stop: &'a mut StopFlag,
}

impl<'a> Initialize<'a> {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn time(&self) -> f64 {
        self.clock.time
    }

    pub fn timestep(&self) -> f64 {
        self.clock.timestep
    }

    fn decl(&self, port: impl PortRef) -> &PortDecl {
        &self.ports[port.port_index()]
    }

    fn binding(&self, port: impl PortRef) -> &PortBinding {
        self.bindings
            .get(port.port_index())
            .unwrap_or(&PortBinding::Unconnected)
    }

    pub fn port_name(&self, port: impl PortRef) -> &str {
        &self.decl(port).name
    }

    pub fn is_connected(&self, port: impl PortRef) -> bool {
        self.binding(port).is_connected()
    }

    /// Connected sub-port count (0 or 1 for single ports).
    pub fn num_ports(&self, port: impl PortRef) -> usize {
        self.binding(port).num_ports()
    }

    fn check_type<S: NodeSlot>(&self, port: impl PortRef, slot: S) -> ComponentResult<()> {
        let decl = self.decl(port);
        match decl.node_type {
            Some(nt) if nt == slot.node_type() => Ok(()),
            other => Err(ComponentError::WrongNodeType {
                port: format!("{}.{}", self.name, decl.name),
                expected: other.map(|nt| nt.to_string()).unwrap_or_default(),
                actual: slot.node_type().to_string(),
            }),
        }
    }

    fn resolve<S: NodeSlot>(&mut self, port: impl PortRef, slot: S, fallback: f64) -> ComponentResult<SlotRef> {
        self.check_type(port, slot)?;
        let node = self.binding(port).nodes().first().copied();
        match node {
            Some(node) => Ok(self.nodes.slot(node, slot)?),
            None if self.decl(port).is_required() => Err(ComponentError::Unconnected {
                component: self.name.to_string(),
                port: self.decl(port).name.clone(),
            }),
            None => Ok(self.nodes.add_scratch(fallback)),
        }
    }

    /// Writable slot. An unconnected optional port gets component-local
    /// storage preset to the slot's node default.
    pub fn slot<S: NodeSlot>(&mut self, port: impl Writable, slot: S) -> ComponentResult<SlotRef> {
        self.resolve(port, slot, slot.default_value())
    }

    /// Read-only slot of any single port.
    pub fn read<S: NodeSlot>(&mut self, port: impl PortRef, slot: S) -> ComponentResult<ReadRef> {
        Ok(self.resolve(port, slot, slot.default_value())?.read_only())
    }

    pub fn read_or<S: NodeSlot>(&mut self, port: impl PortRef, slot: S, fallback: f64) -> ComponentResult<ReadRef> {
        Ok(self.resolve(port, slot, fallback)?.read_only())
    }

    fn multi_refs<S: NodeSlot>(&self, port: impl MultiPortRef, slot: S) -> ComponentResult<Vec<SlotRef>> {
        self.check_type(port, slot)?;
        self.binding(port)
            .nodes()
            .iter()
            .map(|&node| self.nodes.slot(node, slot).map_err(ComponentError::from))
            .collect()
    }

    /// Writable slot of every connected sub-port of a power multi-port.
    pub fn multi<S: NodeSlot>(&mut self, port: PowerMultiPort, slot: S) -> ComponentResult<MultiSlots> {
        Ok(MultiSlots {
            refs: self.multi_refs(port, slot)?,
        })
    }

    /// Readable slot of every connected sub-port.
    pub fn multi_read<S: NodeSlot>(&mut self, port: impl MultiPortRef, slot: S) -> ComponentResult<MultiRead> {
        let refs = self.multi_refs(port, slot)?;
        Ok(MultiRead {
            refs: refs.into_iter().map(SlotRef::read_only).collect(),
        })
    }

    /// Signal value of an input variable, or its parameter when unconnected.
    pub fn input(&mut self, input: Input) -> ComponentResult<ReadRef> {
        let fallback = self.params.value(input.param);
        self.read_or(input.port, SignalSlot::Value, fallback)
    }

    pub fn output(&mut self, output: Output) -> ComponentResult<SlotRef> {
        self.slot(output.0, SignalSlot::Value)
    }

    pub fn constant(&self, param: ParamHandle) -> f64 {
        self.params.value(param)
    }

    #[inline]
    pub fn get(&self, slot: impl Into<ReadRef>) -> f64 {
        self.nodes.get(slot)
    }

    #[inline]
    pub fn set(&mut self, slot: SlotRef, value: f64) {
        self.nodes.set(slot, value);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.messages.info(text, self.name);
    }

    pub fn warning(&self, text: impl Into<String>) {
        self.messages.warning(text, self.name);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.messages.error(text, self.name);
    }

    pub fn stop_simulation(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.messages
            .error(format!("{} stopped the simulation: {}", self.name, reason), "stop");
        self.stop.request(reason);
    }
}

/// Per-step view.
pub struct Step<'a> {
    pub(crate) nodes: &'a mut NodeData,
    pub(crate) name: &'a str,
    pub(crate) clock: Clock,
    pub(crate) messages: &'a MessageHandler,
    pub(crate) stop: &'a mut StopFlag,
}

impl<'a> Step<'a> {
    #[inline]
    pub fn time(&self) -> f64 {
        self.clock.time
    }

    #[inline]
    pub fn timestep(&self) -> f64 {
        self.clock.timestep
    }

    #[inline]
    pub fn get(&self, slot: impl Into<ReadRef>) -> f64 {
        self.nodes.get(slot)
    }

    #[inline]
    pub fn set(&mut self, slot: SlotRef, value: f64) {
        self.nodes.set(slot, value);
    }

    /// Current values of every sub-port, in connection order.
    pub fn values<'s, M: SubPorts>(&'s self, multi: &'s M) -> impl Iterator<Item = f64> + 's {
        (0..multi.len()).filter_map(move |i| multi.read_ref(i).map(|r| self.nodes.get(r)))
    }

    pub fn sum<M: SubPorts>(&self, multi: &M) -> f64 {
        self.values(multi).sum()
    }

    pub fn set_all(&mut self, multi: &MultiSlots, value: f64) {
        for slot in multi.iter() {
            self.nodes.set(slot, value);
        }
    }

    pub fn warning(&self, text: impl Into<String>) {
        self.messages.warning(text, self.name);
    }

    pub fn stop_simulation(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.messages.error(
            format!("{} stopped the simulation at t={}: {}", self.name, self.clock.time, reason),
            "stop",
        );
        self.stop.request(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_flag_keeps_first_reason() {
        let mut flag = StopFlag::default();
        assert!(!flag.is_requested());
        flag.request("first");
        flag.request("second");
        assert_eq!(flag.reason(), Some("first"));
        flag.clear();
        assert!(!flag.is_requested());
    }

    #[test]
    fn configure_records_declarations() {
        let mut ports = Vec::new();
        let mut params = Parameters::new("c");
        let mut cfg = Configure {
            ports: &mut ports,
            params: &mut params,
        };
        let p1 = cfg.power_port("P1", NodeType::Mechanic);
        let k = cfg.input_variable("k", "Stiffness", "N/m", 1e3);
        let out = cfg.output_variable("out", "Output");
        assert_eq!(p1.port_index(), 0);
        assert_eq!(k.port.port_index(), 1);
        assert_eq!(out.0.port_index(), 2);
        assert_eq!(ports[1].name, "k");
        assert_eq!(ports[1].requirement, Requirement::NotRequired);
        assert_eq!(params.value(k.param), 1e3);
    }
}
