//! A named component: the model plus the ports and parameters the
//! framework keeps on its behalf.

use std::collections::HashMap;

use tlm_core::MessageHandler;
use tlm_graph::{Cqs, NodeData, NodeSlot, PortBinding, PortDecl, SlotRef};

use crate::context::{Clock, Configure, Initialize, Step, StopFlag};
use crate::error::{ComponentError, ComponentResult};
use crate::parameters::Parameters;
use crate::traits::{Component, ComponentType};

/// Start value for one slot of one port, loaded into the node before
/// components initialize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartValue {
    pub port: usize,
    pub slot: usize,
    pub value: f64,
}

pub type Creator = fn(&mut Configure<'_>) -> Box<dyn Component>;

pub struct ComponentInstance {
    name: String,
    type_name: &'static str,
    cqs: Cqs,
    model: Box<dyn Component>,
    ports: Vec<PortDecl>,
    params: Parameters,
    bindings: Vec<PortBinding>,
    start_values: Vec<StartValue>,
}

impl std::fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("cqs", &self.cqs)
            .field("ports", &self.ports.len())
            .field("params", &self.params.len())
            .finish()
    }
}

impl ComponentInstance {
    /// Build through a creator function, as the factory does.
    pub fn with_creator(
        name: &str,
        type_name: &'static str,
        cqs: Cqs,
        create: Creator,
    ) -> ComponentResult<Self> {
        let mut ports = Vec::new();
        let mut params = Parameters::new(name);
        let model = create(&mut Configure {
            ports: &mut ports,
            params: &mut params,
        });

        for (i, port) in ports.iter().enumerate() {
            if ports[..i].iter().any(|p| p.name == port.name) {
                return Err(ComponentError::DuplicateName {
                    component: name.to_string(),
                    what: format!("port {}", port.name),
                });
            }
        }
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        for (i, param) in names.iter().enumerate() {
            if names[..i].contains(param) {
                return Err(ComponentError::DuplicateName {
                    component: name.to_string(),
                    what: format!("parameter {}", param),
                });
            }
        }

        let bindings = vec![PortBinding::Unconnected; ports.len()];
        Ok(Self {
            name: name.to_string(),
            type_name,
            cqs,
            model,
            ports,
            params,
            bindings,
            start_values: Vec::new(),
        })
    }

    pub fn of<T: ComponentType>(name: &str) -> ComponentResult<Self> {
        Self::with_creator(name, T::TYPE_NAME, T::CQS, crate::factory::create::<T>)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.params.set_owner(name);
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn cqs(&self) -> Cqs {
        self.cqs
    }

    pub fn ports(&self) -> &[PortDecl] {
        &self.ports
    }

    pub fn port_index(&self, port: &str) -> ComponentResult<usize> {
        self.ports
            .iter()
            .position(|p| p.name == port)
            .ok_or_else(|| ComponentError::UnknownPort {
                component: self.name.clone(),
                port: port.to_string(),
            })
    }

    pub fn port(&self, port: &str) -> Option<&PortDecl> {
        self.ports.iter().find(|p| p.name == port)
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    pub fn set_parameter_value(&mut self, name: &str, value: f64) -> ComponentResult<()> {
        self.params.set_value(name, value)
    }

    /// Start value by slot position; the system resolves slot names.
    pub fn set_start_value_at(&mut self, port: &str, slot: usize, value: f64) -> ComponentResult<()> {
        let port = self.port_index(port)?;
        crate::common::check_finite(value, "start value")?;
        match self
            .start_values
            .iter_mut()
            .find(|s| s.port == port && s.slot == slot)
        {
            Some(existing) => existing.value = value,
            None => self.start_values.push(StartValue { port, slot, value }),
        }
        Ok(())
    }

    pub fn set_start_value<S: NodeSlot>(&mut self, port: &str, slot: S, value: f64) -> ComponentResult<()> {
        let decl = self.port(port).ok_or_else(|| ComponentError::UnknownPort {
            component: self.name.clone(),
            port: port.to_string(),
        })?;
        if decl.node_type != Some(slot.node_type()) {
            return Err(ComponentError::WrongNodeType {
                port: format!("{}.{}", self.name, port),
                expected: decl.node_type.map(|nt| nt.to_string()).unwrap_or_default(),
                actual: slot.node_type().to_string(),
            });
        }
        self.set_start_value_at(port, slot.index(), value)
    }

    pub fn start_values(&self) -> &[StartValue] {
        &self.start_values
    }

    pub fn bindings(&self) -> &[PortBinding] {
        &self.bindings
    }

    pub fn bind(&mut self, bindings: Vec<PortBinding>) {
        self.bindings = bindings;
        self.bindings.resize(self.ports.len(), PortBinding::Unconnected);
    }

    pub fn unbind(&mut self) {
        self.bindings = vec![PortBinding::Unconnected; self.ports.len()];
    }

    /// First required port with no binding.
    pub fn check_required_ports(&self) -> ComponentResult<()> {
        for (decl, binding) in self.ports.iter().zip(&self.bindings) {
            if decl.is_required() && !binding.is_connected() {
                return Err(ComponentError::Unconnected {
                    component: self.name.clone(),
                    port: decl.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Write start values into bound nodes. `written` remembers which
    /// component set each slot so later overwrites can be reported.
    pub fn load_start_values(
        &self,
        nodes: &mut NodeData,
        written: &mut HashMap<SlotRef, String>,
        messages: &MessageHandler,
    ) -> ComponentResult<()> {
        for start in &self.start_values {
            for &node in self.bindings[start.port].nodes() {
                let slot = nodes.slot_at(node, start.slot)?;
                if let Some(previous) = written.get(&slot)
                    && previous != &self.name
                {
                    messages.debug(
                        format!(
                            "Start value from {}.{} overrides the one from {}",
                            self.name, self.ports[start.port].name, previous
                        ),
                        "startvalue",
                    );
                }
                written.insert(slot, self.name.clone());
                nodes.set(slot, start.value);
            }
        }
        Ok(())
    }

    pub fn initialize(
        &mut self,
        nodes: &mut NodeData,
        clock: Clock,
        messages: &MessageHandler,
        stop: &mut StopFlag,
    ) -> ComponentResult<()> {
        self.check_required_ports()?;
        self.params.check_finite()?;
        let mut init = Initialize {
            nodes,
            ports: &self.ports,
            bindings: &self.bindings,
            params: &self.params,
            name: &self.name,
            clock,
            messages,
            stop,
        };
        self.model.initialize(&mut init)
    }

    #[inline]
    pub fn simulate_one_timestep(
        &mut self,
        nodes: &mut NodeData,
        clock: Clock,
        messages: &MessageHandler,
        stop: &mut StopFlag,
    ) {
        let mut step = Step {
            nodes,
            name: &self.name,
            clock,
            messages,
            stop,
        };
        self.model.simulate_one_timestep(&mut step);
    }

    pub fn finalize(&mut self) {
        self.model.finalize();
    }
}
