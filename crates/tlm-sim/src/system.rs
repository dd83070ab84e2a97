//! Component systems: assembly, validation and the step loop.
//!
//! A [`ComponentSystem`] owns its members (components and nested systems),
//! the connections between their ports and its own boundary ports. The
//! system a run is initialized on acts as the root: it flattens the whole
//! hierarchy into one [`NodeData`] arena, binds every component to it and
//! drives the step loop. Nested systems keep their own clock and are
//! sub-cycled when their timestep divides the parent's.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tlm_components::{Clock, ComponentInstance, StopFlag};
use tlm_core::timing::{PhaseClock, Timer};
use tlm_core::{MessageHandler, integer_ratio, num_steps};
use tlm_graph::{
    Cqs, DisjointSet, GraphError, NodeCheck, NodeData, NodeType, NodeTypeRegistry, PortDecl,
    PortKind, SlotRef, SortHint, Terminal, check_node, check_pair,
};

use crate::error::{SimError, SimResult};
use crate::flatten::{self, Network, Path};
use crate::logging::{LogSettings, NodeLog};
use crate::order::{self, Access};

/// One side of a connection: a port of a member, or one of the system's
/// own ports (addressed with the port name as both fields).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub component: String,
    pub port: String,
}

impl Endpoint {
    pub fn new(component: &str, port: &str) -> Self {
        Self {
            component: component.to_string(),
            port: port.to_string(),
        }
    }

    /// The system port `name` seen from inside its system.
    pub fn system_port(name: &str) -> Self {
        Self::new(name, name)
    }

    /// Parse `component.port`, or a bare system port name.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        match text.split_once('.') {
            Some((component, port)) if !component.is_empty() && !port.is_empty() => {
                Some(Self::new(component, port))
            }
            Some(_) => None,
            None => Some(Self::system_port(text)),
        }
    }

    pub fn is_system_port(&self) -> bool {
        self.component == self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_system_port() {
            f.write_str(&self.component)
        } else {
            write!(f, "{}.{}", self.component, self.port)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub a: Endpoint,
    pub b: Endpoint,
}

impl Connection {
    fn joins(&self, a: &Endpoint, b: &Endpoint) -> bool {
        (&self.a == a && &self.b == b) || (&self.a == b && &self.b == a)
    }

    fn touches(&self, name: &str) -> bool {
        self.a.component == name || self.b.component == name
    }
}

#[derive(Debug)]
pub enum Member {
    Component(ComponentInstance),
    System(Box<ComponentSystem>),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Component(c) => c.name(),
            Member::System(s) => s.name(),
        }
    }

    fn set_name(&mut self, name: &str) {
        match self {
            Member::Component(c) => c.set_name(name),
            Member::System(s) => s.name = name.to_string(),
        }
    }

    /// Causality used for ordering; subsystems get theirs at initialize.
    pub fn cqs(&self) -> Cqs {
        match self {
            Member::Component(c) => c.cqs(),
            Member::System(s) => s.cqs,
        }
    }

    fn access(&self) -> Access {
        match self {
            Member::Component(c) => {
                let mut access = Access::default();
                for (decl, binding) in c.ports().iter().zip(c.bindings()) {
                    let nodes = binding.nodes().iter().copied();
                    match (decl.kind, decl.sort_hint) {
                        (PortKind::Write, _) => access.writes.extend(nodes),
                        (PortKind::Read | PortKind::ReadMulti, SortHint::IndependentDestination) => {
                            access.delayed_reads.extend(nodes)
                        }
                        (PortKind::Read | PortKind::ReadMulti, _) => access.reads.extend(nodes),
                        _ => {}
                    }
                }
                access
            }
            Member::System(s) => s.members.iter().fold(Access::default(), |mut acc, m| {
                acc.extend(m.access());
                acc
            }),
        }
    }
}

/// Where an endpoint points inside one system.
pub(crate) enum Located {
    OwnPort(usize),
    /// For a subsystem member, `port` indexes its system ports.
    Member { member: usize, port: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemState {
    Configured,
    Initialized,
    Running,
    Finalized,
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SystemState::Configured => "configured",
            SystemState::Initialized => "initialized",
            SystemState::Running => "running",
            SystemState::Finalized => "finalized",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SimOutcome {
    Completed { time: f64, steps: u64 },
    Stopped { time: f64, reason: String },
}

/// Per-run state, owned by the root system only.
struct Runtime {
    nodes: NodeData,
    stop: StopFlag,
    log: NodeLog,
    fatal_baseline: u64,
    wall: PhaseClock,
}

impl Runtime {
    fn stop_reason(&self, messages: &MessageHandler) -> Option<String> {
        if let Some(reason) = self.stop.reason() {
            return Some(reason.to_string());
        }
        if messages.fatal_generation() > self.fatal_baseline {
            return Some("a fatal error was reported".to_string());
        }
        None
    }
}

pub struct ComponentSystem {
    name: String,
    members: Vec<Member>,
    system_ports: Vec<PortDecl>,
    connections: Vec<Connection>,
    parameters: BTreeMap<String, f64>,
    desired_timestep: f64,
    inherit_timestep: bool,
    timestep: f64,
    start_time: f64,
    time: f64,
    steps_taken: u64,
    cqs: Cqs,
    order: Vec<usize>,
    state: SystemState,
    log_settings: LogSettings,
    registry: Arc<NodeTypeRegistry>,
    messages: MessageHandler,
    runtime: Option<Runtime>,
}

impl fmt::Debug for ComponentSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSystem")
            .field("name", &self.name)
            .field("members", &self.members.len())
            .field("connections", &self.connections.len())
            .field("state", &self.state)
            .field("timestep", &self.timestep)
            .finish()
    }
}

fn check_name(name: &str) -> SimResult<()> {
    if name.is_empty() || name.contains(['.', '/']) || name.trim() != name {
        return Err(SimError::InvalidArg {
            what: "names must be non-empty and contain no '.', '/' or surrounding spaces",
        });
    }
    Ok(())
}

impl ComponentSystem {
    /// Stand-alone system with the built-in node types and its own queue.
    pub fn new(name: &str) -> Self {
        Self::with_context(name, Arc::new(NodeTypeRegistry::new()), MessageHandler::new())
    }

    pub(crate) fn with_context(name: &str, registry: Arc<NodeTypeRegistry>, messages: MessageHandler) -> Self {
        Self {
            name: name.to_string(),
            members: Vec::new(),
            system_ports: Vec::new(),
            connections: Vec::new(),
            parameters: BTreeMap::new(),
            desired_timestep: 1e-3,
            inherit_timestep: true,
            timestep: 1e-3,
            start_time: 0.0,
            time: 0.0,
            steps_taken: 0,
            cqs: Cqs::S,
            order: Vec::new(),
            state: SystemState::Configured,
            log_settings: LogSettings::default(),
            registry,
            messages,
            runtime: None,
        }
    }

    fn adopt(&mut self, registry: &Arc<NodeTypeRegistry>, messages: &MessageHandler) {
        self.registry = Arc::clone(registry);
        self.messages = messages.clone();
        for member in &mut self.members {
            if let Member::System(sub) = member {
                sub.adopt(registry, messages);
            }
        }
    }

    // ---- introspection ----

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) -> SimResult<()> {
        check_name(name)?;
        self.name = name.to_string();
        Ok(())
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Steps taken by this system's own clock since initialization.
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Causality seen by the parent; valid after initialization.
    pub fn cqs(&self) -> Cqs {
        self.cqs
    }

    pub fn messages(&self) -> &MessageHandler {
        &self.messages
    }

    pub fn registry(&self) -> &NodeTypeRegistry {
        &self.registry
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name() == name)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentInstance> {
        match self.member(name)? {
            Member::Component(c) => Some(c),
            Member::System(_) => None,
        }
    }

    pub fn component_mut(&mut self, name: &str) -> Option<&mut ComponentInstance> {
        self.members.iter_mut().find_map(|m| match m {
            Member::Component(c) if c.name() == name => Some(c),
            _ => None,
        })
    }

    pub fn subsystem(&self, name: &str) -> Option<&ComponentSystem> {
        match self.member(name)? {
            Member::System(s) => Some(s),
            Member::Component(_) => None,
        }
    }

    pub fn subsystem_mut(&mut self, name: &str) -> Option<&mut ComponentSystem> {
        self.members.iter_mut().find_map(|m| match m {
            Member::System(s) if s.name == name => Some(s.as_mut()),
            _ => None,
        })
    }

    /// Component by `/`-separated path through nested systems.
    pub fn find_component(&self, path: &str) -> Option<&ComponentInstance> {
        let mut system = self;
        let mut segments = path.split('/').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                return system.component(segment);
            }
            system = system.subsystem(segment)?;
        }
        None
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn system_ports(&self) -> &[PortDecl] {
        &self.system_ports
    }

    /// Member names in execution order; empty before initialization.
    pub fn execution_order(&self) -> Vec<&str> {
        self.order.iter().map(|&i| self.members[i].name()).collect()
    }

    fn contains_name(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name() == name) || self.system_ports.iter().any(|p| p.name == name)
    }

    /// `base`, or `base_1`, `base_2`, ... if taken.
    pub fn unique_name(&self, base: &str) -> String {
        if !self.contains_name(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{base}_{i}"))
            .find(|candidate| !self.contains_name(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn unknown(&self, name: &str) -> SimError {
        SimError::UnknownComponent {
            system: self.name.clone(),
            name: name.to_string(),
        }
    }

    pub(crate) fn locate(&self, e: &Endpoint) -> SimResult<Located> {
        if let Some(index) = self.system_ports.iter().position(|p| p.name == e.component) {
            if e.port != e.component {
                return Err(SimError::UnknownPort {
                    component: e.component.clone(),
                    port: e.port.clone(),
                });
            }
            return Ok(Located::OwnPort(index));
        }
        let member = self
            .members
            .iter()
            .position(|m| m.name() == e.component)
            .ok_or_else(|| self.unknown(&e.component))?;
        let port = match &self.members[member] {
            Member::Component(c) => c.port_index(&e.port).ok(),
            Member::System(s) => s.system_ports.iter().position(|p| p.name == e.port),
        };
        let port = port.ok_or_else(|| SimError::UnknownPort {
            component: e.component.clone(),
            port: e.port.clone(),
        })?;
        Ok(Located::Member { member, port })
    }

    fn terminal(&self, e: &Endpoint) -> SimResult<Terminal> {
        let label = e.to_string();
        Ok(match self.locate(e)? {
            Located::OwnPort(i) => Terminal::new(label, PortKind::System, self.system_ports[i].node_type),
            Located::Member { member, port } => match &self.members[member] {
                Member::Component(c) => {
                    let decl = &c.ports()[port];
                    let t = Terminal::new(label, decl.kind, decl.node_type);
                    if decl.kind.is_power() { t.with_cqs(c.cqs()) } else { t }
                }
                Member::System(s) => Terminal::new(label, PortKind::System, s.system_ports[port].node_type),
            },
        })
    }

    // ---- assembly ----

    fn check_editable(&self) -> SimResult<()> {
        match self.state {
            SystemState::Initialized | SystemState::Running => Err(SimError::Busy {
                system: self.name.clone(),
                state: self.state,
            }),
            _ => Ok(()),
        }
    }

    /// Topology changed: results of a finished run no longer describe it.
    fn edited(&mut self) {
        if self.state == SystemState::Finalized {
            self.state = SystemState::Configured;
        }
        self.runtime = None;
        self.order.clear();
    }

    fn report<T>(&self, result: SimResult<T>, tag: &str) -> SimResult<T> {
        if let Err(e) = &result {
            self.messages.error(e.to_string(), tag);
        }
        result
    }

    /// Add a component, renaming it if its name is taken. Returns the name
    /// it was added under.
    pub fn add_component(&mut self, mut component: ComponentInstance) -> SimResult<String> {
        let result = (|| -> SimResult<String> {
            self.check_editable()?;
            check_name(component.name())?;
            let name = self.unique_name(component.name());
            if name != component.name() {
                self.messages.debug(
                    format!("Renamed {} to {} in {}", component.name(), name, self.name),
                    "add",
                );
                component.set_name(&name);
            }
            Ok(name)
        })();
        let name = self.report(result, "add")?;
        self.members.push(Member::Component(component));
        self.edited();
        Ok(name)
    }

    /// Add a nested system, renaming it if its name is taken.
    pub fn add_subsystem(&mut self, mut system: ComponentSystem) -> SimResult<String> {
        let result = (|| -> SimResult<String> {
            self.check_editable()?;
            check_name(&system.name)?;
            system.check_editable()?;
            Ok(self.unique_name(&system.name))
        })();
        let name = self.report(result, "add")?;
        system.name = name.clone();
        system.adopt(&self.registry, &self.messages);
        system.runtime = None;
        self.members.push(Member::System(Box::new(system)));
        self.edited();
        Ok(name)
    }

    /// Remove a member and every connection touching it.
    pub fn remove(&mut self, name: &str) -> SimResult<Member> {
        let result = self.check_editable().and_then(|()| {
            self.members
                .iter()
                .position(|m| m.name() == name)
                .ok_or_else(|| self.unknown(name))
        });
        let index = self.report(result, "remove")?;
        self.connections.retain(|c| !c.touches(name));
        self.edited();
        Ok(self.members.remove(index))
    }

    /// Rename a member or system port, keeping its connections.
    pub fn rename_sub_component(&mut self, old: &str, new: &str) -> SimResult<()> {
        let result = (|| -> SimResult<()> {
            self.check_editable()?;
            check_name(new)?;
            if !self.contains_name(old) {
                return Err(self.unknown(old));
            }
            if old != new && self.contains_name(new) {
                return Err(SimError::DuplicateName {
                    system: self.name.clone(),
                    name: new.to_string(),
                });
            }
            Ok(())
        })();
        self.report(result, "rename")?;
        if old == new {
            return Ok(());
        }

        if let Some(port) = self.system_ports.iter_mut().find(|p| p.name == old) {
            port.name = new.to_string();
            for e in self.connections.iter_mut().flat_map(|c| [&mut c.a, &mut c.b]) {
                if e.component == old {
                    *e = Endpoint::system_port(new);
                }
            }
        } else if let Some(member) = self.members.iter_mut().find(|m| m.name() == old) {
            member.set_name(new);
            for e in self.connections.iter_mut().flat_map(|c| [&mut c.a, &mut c.b]) {
                if e.component == old {
                    e.component = new.to_string();
                }
            }
        }
        self.edited();
        Ok(())
    }

    /// Add a boundary port; its node type is adopted from the first
    /// connection. Returns the name it was added under.
    pub fn add_system_port(&mut self, name: &str) -> SimResult<String> {
        let result = self.check_editable().and_then(|()| check_name(name));
        self.report(result, "add")?;
        let name = self.unique_name(name);
        self.system_ports.push(PortDecl::system(&name));
        self.edited();
        Ok(name)
    }

    pub fn remove_system_port(&mut self, name: &str) -> SimResult<()> {
        let result = self.check_editable().and_then(|()| {
            self.system_ports
                .iter()
                .position(|p| p.name == name)
                .ok_or_else(|| self.unknown(name))
        });
        let index = self.report(result, "remove")?;
        self.system_ports.remove(index);
        self.connections.retain(|c| !c.touches(name));
        self.edited();
        Ok(())
    }

    /// Ends of the node `connections[edge]` belongs to, as seen at this
    /// level. Multi-port ends count once per connection.
    fn local_node(&self, connections: &[Connection], edge: usize) -> SimResult<Vec<(Endpoint, Terminal)>> {
        let mut set = DisjointSet::new(0);
        let mut keys: HashMap<(Endpoint, Option<usize>), usize> = HashMap::new();
        let mut ends: Vec<(Endpoint, Terminal)> = Vec::new();
        let mut first_end = Vec::with_capacity(connections.len());
        for (i, c) in connections.iter().enumerate() {
            let mut pair = [0usize; 2];
            for (slot, e) in pair.iter_mut().zip([&c.a, &c.b]) {
                let t = self.terminal(e)?;
                let key = (e.clone(), t.kind.is_multi().then_some(i));
                *slot = *keys.entry(key).or_insert_with(|| {
                    ends.push((e.clone(), t));
                    set.push()
                });
            }
            set.union(pair[0], pair[1]);
            first_end.push(pair[0]);
        }
        let root = set.find(first_end[edge]);
        Ok(ends
            .into_iter()
            .enumerate()
            .filter(|(i, _)| set.find(*i) == root)
            .map(|(_, end)| end)
            .collect())
    }

    fn adopt_node_type(&mut self, e: &Endpoint, node_type: NodeType) {
        let port = match self.locate(e) {
            Ok(Located::OwnPort(i)) => self.system_ports.get_mut(i),
            Ok(Located::Member { member, port }) => match &mut self.members[member] {
                Member::System(s) => s.system_ports.get_mut(port),
                Member::Component(_) => None,
            },
            Err(_) => None,
        };
        if let Some(decl) = port
            && decl.node_type.is_none()
        {
            decl.node_type = Some(node_type);
        }
    }

    pub fn connect(&mut self, a_component: &str, a_port: &str, b_component: &str, b_port: &str) -> SimResult<()> {
        self.connect_endpoints(Endpoint::new(a_component, a_port), Endpoint::new(b_component, b_port))
    }

    pub fn connect_endpoints(&mut self, a: Endpoint, b: Endpoint) -> SimResult<()> {
        let result = self.check_connection(&a, &b);
        let (node_type, blank) = self.report(result, "connect")?;
        if let Some(node_type) = node_type {
            for e in &blank {
                self.adopt_node_type(e, node_type);
            }
        }
        self.messages.debug(format!("Connected {a} and {b} in {}", self.name), "connect");
        self.connections.push(Connection { a, b });
        self.edited();
        Ok(())
    }

    /// Node type of the resulting node and the blank system ports on it.
    fn check_connection(&self, a: &Endpoint, b: &Endpoint) -> SimResult<(Option<NodeType>, Vec<Endpoint>)> {
        self.check_editable()?;
        let ta = self.terminal(a)?;
        let tb = self.terminal(b)?;
        check_pair(&ta, &tb)?;
        if self.connections.iter().any(|c| c.joins(a, b)) {
            return Err(GraphError::AlreadyConnected {
                a: a.to_string(),
                b: b.to_string(),
            }
            .into());
        }
        let mut candidate = self.connections.clone();
        candidate.push(Connection {
            a: a.clone(),
            b: b.clone(),
        });
        let ends = self.local_node(&candidate, candidate.len() - 1)?;
        let terminals: Vec<Terminal> = ends.iter().map(|(_, t)| t.clone()).collect();
        let node_type = check_node(&terminals, NodeCheck::Partial)?;
        let blank = ends
            .into_iter()
            .filter(|(_, t)| t.kind == PortKind::System && t.node_type.is_none())
            .map(|(e, _)| e)
            .collect();
        Ok((node_type, blank))
    }

    pub fn disconnect(&mut self, a_component: &str, a_port: &str, b_component: &str, b_port: &str) -> SimResult<()> {
        let a = Endpoint::new(a_component, a_port);
        let b = Endpoint::new(b_component, b_port);
        let result = self.check_editable().and_then(|()| {
            self.connections
                .iter()
                .position(|c| c.joins(&a, &b))
                .ok_or_else(|| SimError::NotConnected {
                    a: a.to_string(),
                    b: b.to_string(),
                })
        });
        let index = self.report(result, "disconnect")?;
        self.connections.remove(index);
        self.messages.debug(format!("Disconnected {a} and {b} in {}", self.name), "disconnect");
        self.edited();
        Ok(())
    }

    // ---- parameters and start values ----

    fn component_or_err(&mut self, name: &str) -> SimResult<&mut ComponentInstance> {
        let system = self.name.clone();
        self.component_mut(name).ok_or(SimError::UnknownComponent {
            system,
            name: name.to_string(),
        })
    }

    /// Takes effect at the next initialization.
    pub fn set_parameter_value(&mut self, component: &str, parameter: &str, value: f64) -> SimResult<()> {
        let result = self
            .component_or_err(component)
            .and_then(|c| Ok(c.set_parameter_value(parameter, value)?));
        self.report(result, "parameter")
    }

    /// Make a component parameter follow a system parameter of this system
    /// or of any system above it.
    pub fn bind_parameter(&mut self, component: &str, parameter: &str, system_parameter: &str) -> SimResult<()> {
        let result = self
            .component_or_err(component)
            .and_then(|c| Ok(c.parameters_mut().bind(parameter, system_parameter)?));
        self.report(result, "parameter")
    }

    pub fn set_system_parameter(&mut self, name: &str, value: f64) -> SimResult<()> {
        let result = check_name(name).and_then(|()| {
            tlm_core::ensure_finite(value, name)?;
            Ok(())
        });
        self.report(result, "parameter")?;
        self.parameters.insert(name.to_string(), value);
        Ok(())
    }

    pub fn system_parameter(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }

    pub fn system_parameters(&self) -> &BTreeMap<String, f64> {
        &self.parameters
    }

    pub fn remove_system_parameter(&mut self, name: &str) -> Option<f64> {
        self.parameters.remove(name)
    }

    /// Start value of slot `slot` (long or short name) on `component.port`.
    pub fn set_start_value(&mut self, component: &str, port: &str, slot: &str, value: f64) -> SimResult<()> {
        let registry = Arc::clone(&self.registry);
        let result = self.component_or_err(component).and_then(|c| {
            let decl = c.port(port).ok_or_else(|| SimError::UnknownPort {
                component: component.to_string(),
                port: port.to_string(),
            })?;
            let node_type = decl.node_type.ok_or(SimError::InvalidArg {
                what: "port has no node type",
            })?;
            let index = registry.slot_index(node_type, slot)?;
            Ok(c.set_start_value_at(port, index, value)?)
        });
        self.report(result, "startvalue")
    }

    // ---- timing and logging ----

    /// A non-positive timestep means "same as the parent".
    pub fn set_desired_timestep(&mut self, timestep: f64) -> SimResult<()> {
        if !timestep.is_finite() {
            return self.report(
                Err(SimError::InvalidArg {
                    what: "timestep must be finite",
                }),
                "timestep",
            );
        }
        self.desired_timestep = timestep;
        Ok(())
    }

    pub fn desired_timestep(&self) -> f64 {
        self.desired_timestep
    }

    pub fn set_inherit_timestep(&mut self, inherit: bool) {
        self.inherit_timestep = inherit;
    }

    pub fn inherits_timestep(&self) -> bool {
        self.inherit_timestep
    }

    /// Timestep in use; resolved against the parent at initialization.
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    pub fn set_log_settings(&mut self, settings: LogSettings) {
        self.log_settings = settings;
    }

    pub fn log_settings(&self) -> LogSettings {
        self.log_settings
    }

    pub fn log(&self) -> Option<&NodeLog> {
        self.runtime.as_ref().map(|rt| &rt.log)
    }

    pub fn log_times(&self) -> &[f64] {
        self.log().map(NodeLog::times).unwrap_or(&[])
    }

    /// Logged values of `slot` on `path.port`. Multi-ports report their
    /// first sub-port.
    pub fn log_series(&self, path: &str, port: &str, slot: &str) -> SimResult<Vec<f64>> {
        let slot = self.port_slot(path, port, slot)?;
        Ok(self.log().map(|log| log.series(slot)).unwrap_or_default())
    }

    /// Current value of `slot` on `path.port`.
    pub fn port_value(&self, path: &str, port: &str, slot: &str) -> SimResult<f64> {
        let slot = self.port_slot(path, port, slot)?;
        let rt = self.runtime.as_ref().ok_or_else(|| self.not_initialized())?;
        Ok(rt.nodes.get(slot))
    }

    /// Arena handle of `slot` on `path.port` in the current run.
    pub fn port_slot(&self, path: &str, port: &str, slot: &str) -> SimResult<SlotRef> {
        let rt = self.runtime.as_ref().ok_or_else(|| self.not_initialized())?;
        let component = self.find_component(path).ok_or_else(|| self.unknown(path))?;
        let index = component.port_index(port)?;
        let node = component
            .bindings()
            .get(index)
            .and_then(|b| b.nodes().first().copied())
            .ok_or_else(|| SimError::Unbound {
                port: format!("{path}.{port}"),
            })?;
        let node_type = rt
            .nodes
            .node_type(node)
            .ok_or(GraphError::InvalidNode { node })?;
        let slot = self.registry.slot_index(node_type, slot)?;
        Ok(rt.nodes.slot_at(node, slot)?)
    }

    /// Wall time spent in `simulate`, when timing is enabled.
    pub fn simulation_wall_time(&self) -> Option<f64> {
        let rt = self.runtime.as_ref()?;
        rt.wall.measured()
    }

    fn not_initialized(&self) -> SimError {
        SimError::NotInitialized {
            system: self.name.clone(),
        }
    }

    // ---- run control ----

    fn set_state(&mut self, state: SystemState) {
        self.state = state;
        for member in &mut self.members {
            if let Member::System(sub) = member {
                sub.set_state(state);
            }
        }
    }

    fn unbind_all(&mut self) {
        for member in &mut self.members {
            match member {
                Member::Component(c) => c.unbind(),
                Member::System(sub) => sub.unbind_all(),
            }
        }
    }

    /// Flatten, validate and initialize the whole hierarchy. On failure
    /// nothing is left initialized.
    pub fn initialize(&mut self, start: f64, stop: f64) -> SimResult<()> {
        // a running system keeps its run
        let busy = self.check_editable();
        self.report(busy, "initialize")?;
        let timer = Timer::start("initialize");
        let result = self.try_initialize(start, stop);
        match &result {
            Ok(()) => {
                self.set_state(SystemState::Initialized);
                self.messages.info(
                    format!(
                        "Initialized {} for {} steps of {} s",
                        self.name,
                        num_steps(start, stop, self.timestep),
                        self.timestep
                    ),
                    "initialize",
                );
            }
            Err(e) => {
                self.unbind_all();
                self.runtime = None;
                self.set_state(SystemState::Configured);
                self.messages.error(e.to_string(), "initialize");
            }
        }
        if let Some(elapsed) = timer.stop() {
            tracing::debug!(target: "tlm::timing", system = %self.name, elapsed_s = elapsed, "initialize");
        }
        result
    }

    fn try_initialize(&mut self, start: f64, stop: f64) -> SimResult<()> {
        if !start.is_finite() || !stop.is_finite() {
            return Err(SimError::InvalidArg {
                what: "start and stop times must be finite",
            });
        }
        if stop < start {
            return Err(SimError::InvalidArg {
                what: "stop time is before start time",
            });
        }
        if self.desired_timestep <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "the top level timestep must be positive",
            });
        }
        self.runtime = None;
        self.timestep = self.desired_timestep;

        let mut network = flatten::flatten(self, &self.registry)?;
        self.bind_members(&mut network, &mut Vec::new());
        let Network { mut nodes, .. } = network;

        self.prepare(start, &mut Vec::new())?;

        let mut written = HashMap::new();
        self.load_start_values(&mut nodes, &mut written)?;

        let mut stop_flag = StopFlag::default();
        self.initialize_members(&mut nodes, &mut stop_flag)?;
        if let Some(reason) = stop_flag.reason() {
            return Err(SimError::Backend {
                message: format!("initialization stopped: {reason}"),
            });
        }

        let mut log = NodeLog::new(self.log_settings, start, stop, self.timestep, nodes.len());
        log.initial(self.time, &nodes);
        self.runtime = Some(Runtime {
            nodes,
            stop: StopFlag::default(),
            log,
            fatal_baseline: self.messages.fatal_generation(),
            wall: PhaseClock::default(),
        });
        Ok(())
    }

    fn bind_members(&mut self, network: &mut Network, path: &mut Path) {
        for (j, member) in self.members.iter_mut().enumerate() {
            path.push(j);
            match member {
                Member::Component(c) => c.bind(network.bindings.remove(path.as_slice()).unwrap_or_default()),
                Member::System(sub) => {
                    sub.cqs = network.subsystem_cqs.get(path.as_slice()).copied().unwrap_or(Cqs::S);
                    sub.bind_members(network, path);
                }
            }
            path.pop();
        }
    }

    /// Resolve parameters and timesteps, check ports and fix the order.
    fn prepare(&mut self, start: f64, scope: &mut Vec<BTreeMap<String, f64>>) -> SimResult<()> {
        self.start_time = start;
        self.time = start;
        self.steps_taken = 0;
        scope.push(self.parameters.clone());
        for member in &mut self.members {
            match member {
                Member::Component(c) => {
                    let lookup = |name: &str| scope.iter().rev().find_map(|p| p.get(name).copied());
                    if let Err(binding) = c.parameters_mut().resolve(lookup) {
                        let parameter = c
                            .parameters()
                            .iter()
                            .find(|p| p.binding.as_deref() == Some(binding.as_str()))
                            .map(|p| p.name.clone())
                            .unwrap_or_default();
                        return Err(SimError::UnresolvedParameter {
                            component: c.name().to_string(),
                            parameter,
                            binding,
                        });
                    }
                    c.parameters().check_finite()?;
                    c.check_required_ports()?;
                }
                Member::System(sub) => {
                    sub.timestep = if sub.inherit_timestep || sub.desired_timestep <= 0.0 {
                        self.timestep
                    } else {
                        integer_ratio(self.timestep, sub.desired_timestep).map_err(|_| {
                            SimError::TimestepRatio {
                                system: sub.name.clone(),
                                outer: self.timestep,
                                inner: sub.desired_timestep,
                            }
                        })?;
                        sub.desired_timestep
                    };
                    sub.prepare(start, scope)?;
                }
            }
        }
        scope.pop();
        self.order = self.compute_order()?;
        Ok(())
    }

    fn compute_order(&self) -> SimResult<Vec<usize>> {
        let mut result = Vec::with_capacity(self.members.len());
        for cqs in [Cqs::S, Cqs::C, Cqs::Q] {
            let group: Vec<usize> = (0..self.members.len())
                .filter(|&i| self.members[i].cqs() == cqs)
                .collect();
            let access: Vec<Access> = group.iter().map(|&i| self.members[i].access()).collect();
            let edges = order::dependencies(&access);
            match order::evaluation_order(group.len(), &edges) {
                Ok(local) => result.extend(local.into_iter().map(|l| group[l])),
                Err(blocked) if cqs == Cqs::S => {
                    return Err(SimError::AlgebraicLoop {
                        system: self.name.clone(),
                        members: blocked
                            .into_iter()
                            .map(|l| self.members[group[l]].name().to_string())
                            .collect(),
                    });
                }
                Err(_) => {
                    self.messages.warning(
                        format!(
                            "Dependency cycle among {}-type members of {}; keeping insertion order",
                            cqs, self.name
                        ),
                        "initialize",
                    );
                    result.extend(group);
                }
            }
        }
        Ok(result)
    }

    fn load_start_values(&self, nodes: &mut NodeData, written: &mut HashMap<SlotRef, String>) -> SimResult<()> {
        for member in &self.members {
            match member {
                Member::Component(c) => c.load_start_values(nodes, written, &self.messages)?,
                Member::System(sub) => sub.load_start_values(nodes, written)?,
            }
        }
        Ok(())
    }

    fn initialize_members(&mut self, nodes: &mut NodeData, stop: &mut StopFlag) -> SimResult<()> {
        let clock = Clock {
            time: self.time,
            timestep: self.timestep,
        };
        let Self {
            members,
            order,
            messages,
            ..
        } = self;
        for &i in order.iter() {
            match &mut members[i] {
                Member::Component(c) => c.initialize(nodes, clock, messages, stop)?,
                Member::System(sub) => sub.initialize_members(nodes, stop)?,
            }
        }
        Ok(())
    }

    /// Advance to `stop_time` or until a stop is requested.
    pub fn simulate(&mut self, stop_time: f64) -> SimResult<SimOutcome> {
        let result = match self.state {
            SystemState::Initialized | SystemState::Running => match self.runtime.take() {
                Some(rt) if stop_time.is_finite() => Ok(rt),
                Some(rt) => {
                    self.runtime = Some(rt);
                    Err(SimError::InvalidArg {
                        what: "stop time must be finite",
                    })
                }
                None => Err(self.not_initialized()),
            },
            _ => Err(self.not_initialized()),
        };
        let mut rt = self.report(result, "simulate")?;

        let timer = Timer::start("simulate");
        let outcome = self.run(&mut rt, stop_time);
        timer.stop_into(&mut rt.wall);
        self.runtime = Some(rt);

        match &outcome {
            SimOutcome::Completed { time, steps } => self
                .messages
                .info(format!("Simulated {steps} steps of {}, t = {time}", self.name), "simulate"),
            SimOutcome::Stopped { time, reason } => self
                .messages
                .warning(format!("Simulation of {} stopped at t = {time}: {reason}", self.name), "simulate"),
        }
        Ok(outcome)
    }

    fn run(&mut self, rt: &mut Runtime, stop_time: f64) -> SimOutcome {
        self.set_state(SystemState::Running);
        let steps = num_steps(self.time, stop_time, self.timestep);
        let mut taken = 0;
        for _ in 0..steps {
            if let Some(reason) = rt.stop_reason(&self.messages) {
                return SimOutcome::Stopped {
                    time: self.time,
                    reason,
                };
            }
            self.advance();
            taken += 1;
            self.step_members(&mut rt.nodes, &mut rt.stop);
            rt.log.after_step(self.time, &rt.nodes);
        }
        match rt.stop_reason(&self.messages) {
            Some(reason) => SimOutcome::Stopped {
                time: self.time,
                reason,
            },
            None => SimOutcome::Completed {
                time: self.time,
                steps: taken,
            },
        }
    }

    /// Time is derived from the step count so it never drifts from the grid.
    fn advance(&mut self) {
        self.steps_taken += 1;
        self.time = self.start_time + self.steps_taken as f64 * self.timestep;
    }

    fn step_members(&mut self, nodes: &mut NodeData, stop: &mut StopFlag) {
        let clock = Clock {
            time: self.time,
            timestep: self.timestep,
        };
        let Self {
            members,
            order,
            messages,
            ..
        } = self;
        for &i in order.iter() {
            match &mut members[i] {
                Member::Component(c) => c.simulate_one_timestep(nodes, clock, messages, stop),
                Member::System(sub) => sub.simulate_until(nodes, clock.time, stop),
            }
        }
    }

    /// Sub-cycle up to the parent's time. Boundary nodes keep the values the
    /// parent wrote until the parent's next step.
    fn simulate_until(&mut self, nodes: &mut NodeData, target: f64, stop: &mut StopFlag) {
        for _ in 0..num_steps(self.time, target, self.timestep) {
            self.advance();
            self.step_members(nodes, stop);
        }
    }

    /// Finish the run. Logged values stay available until the topology
    /// changes or the system is initialized again.
    pub fn finalize(&mut self) -> SimResult<()> {
        let result = match self.state {
            SystemState::Initialized | SystemState::Running => Ok(()),
            _ => Err(self.not_initialized()),
        };
        self.report(result, "finalize")?;
        self.finalize_members();
        self.set_state(SystemState::Finalized);
        self.messages.debug(format!("Finalized {}", self.name), "finalize");
        Ok(())
    }

    fn finalize_members(&mut self) {
        for member in &mut self.members {
            match member {
                Member::Component(c) => c.finalize(),
                Member::System(sub) => sub.finalize_members(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_parsing() {
        assert_eq!(Endpoint::parse("mass.P1"), Some(Endpoint::new("mass", "P1")));
        assert_eq!(Endpoint::parse("in"), Some(Endpoint::system_port("in")));
        assert_eq!(Endpoint::parse(".P1"), None);
        assert_eq!(Endpoint::parse(""), None);
        assert_eq!(Endpoint::new("mass", "P1").to_string(), "mass.P1");
        assert_eq!(Endpoint::system_port("in").to_string(), "in");
    }

    #[test]
    fn unique_names_get_suffixes() {
        let mut system = ComponentSystem::new("root");
        assert_eq!(system.add_system_port("in").unwrap(), "in");
        assert_eq!(system.add_system_port("in").unwrap(), "in_1");
        assert_eq!(system.unique_name("in"), "in_2");
        assert_eq!(system.unique_name("out"), "out");
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut system = ComponentSystem::new("root");
        assert!(matches!(system.add_system_port("a.b"), Err(SimError::InvalidArg { .. })));
        assert!(system.set_name("x/y").is_err());
        assert!(system.messages().has_errors());
    }

    #[test]
    fn simulate_requires_initialization() {
        let mut system = ComponentSystem::new("root");
        assert!(matches!(system.simulate(1.0), Err(SimError::NotInitialized { .. })));
        assert!(matches!(system.finalize(), Err(SimError::NotInitialized { .. })));
    }

    #[test]
    fn empty_system_runs() {
        let mut system = ComponentSystem::new("root");
        system.set_desired_timestep(0.1).unwrap();
        system.initialize(0.0, 1.0).unwrap();
        let outcome = system.simulate(1.0).unwrap();
        assert!(matches!(outcome, SimOutcome::Completed { steps: 10, .. }));
        assert_eq!(system.steps_taken(), 10);
        assert_eq!(system.time(), 1.0);
        system.finalize().unwrap();
        assert_eq!(system.state(), SystemState::Finalized);
    }
}
