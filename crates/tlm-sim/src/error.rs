//! Error types for system assembly and run control.

use thiserror::Error;
use tlm_components::ComponentError;
use tlm_graph::GraphError;

use crate::system::SystemState;

/// Errors reported by [`ComponentSystem`](crate::ComponentSystem) and
/// [`Essentials`](crate::Essentials).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("{system} has no sub-component or system port named {name}")]
    UnknownComponent { system: String, name: String },

    #[error("{component} has no port named {port}")]
    UnknownPort { component: String, port: String },

    #[error("{system} already contains something named {name}")]
    DuplicateName { system: String, name: String },

    #[error("Ports {a} and {b} are not connected")]
    NotConnected { a: String, b: String },

    #[error("Cannot modify {system} while it is {state}")]
    Busy { system: String, state: SystemState },

    #[error("Port {port} is not bound to a node")]
    Unbound { port: String },

    #[error("{system} has not been initialized")]
    NotInitialized { system: String },

    #[error("Algebraic loop among signal components {}; use a unit delay to break it", members.join(", "))]
    AlgebraicLoop { system: String, members: Vec<String> },

    #[error("Subsystem {system} mixes C-type and Q-type components at its boundary")]
    UndefinedCqs { system: String },

    #[error("Parameter {component}.{parameter} is bound to unknown system parameter {binding}")]
    UnresolvedParameter {
        component: String,
        parameter: String,
        binding: String,
    },

    #[error("Timestep {inner} of subsystem {system} does not evenly divide its parent's {outer}")]
    TimestepRatio {
        system: String,
        outer: f64,
        inner: f64,
    },

    #[error("Library {name} is already registered")]
    DuplicateLibrary { name: String },

    #[error("{0}")]
    Graph(GraphError),

    #[error("{0}")]
    Component(ComponentError),

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<GraphError> for SimError {
    fn from(e: GraphError) -> Self {
        SimError::Graph(e)
    }
}

impl From<ComponentError> for SimError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::Graph(g) => SimError::Graph(g),
            other => SimError::Component(other),
        }
    }
}

impl From<tlm_core::TlmError> for SimError {
    fn from(e: tlm_core::TlmError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algebraic_loop_suggests_a_unit_delay() {
        let err = SimError::AlgebraicLoop {
            system: "root".into(),
            members: vec!["g1".into(), "g2".into()],
        };
        let text = err.to_string();
        assert!(text.contains("g1, g2"));
        assert!(text.contains("unit delay"));
    }

    #[test]
    fn nested_graph_errors_are_unwrapped() {
        let err: SimError = ComponentError::Graph(GraphError::RegistrySealed).into();
        assert_eq!(err, SimError::Graph(GraphError::RegistrySealed));
        let err: SimError = ComponentError::UnknownType {
            type_name: "Nope".into(),
        }
        .into();
        assert!(matches!(err, SimError::Component(_)));
    }
}
