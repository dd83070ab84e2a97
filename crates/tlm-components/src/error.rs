//! Error types for component configuration and initialization.

use thiserror::Error;
use tlm_graph::GraphError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: String },

    #[error("Required port {component}.{port} is not connected")]
    Unconnected { component: String, port: String },

    #[error("{component} has no port named {port}")]
    UnknownPort { component: String, port: String },

    #[error("{component} has no parameter named {parameter}")]
    UnknownParameter { component: String, parameter: String },

    #[error("{component} declares {what} twice")]
    DuplicateName { component: String, what: String },

    #[error("Port {port} carries {expected} but {actual} was requested")]
    WrongNodeType {
        port: String,
        expected: String,
        actual: String,
    },

    #[error("Parameter {parameter} has unit {expected}, got a quantity in {actual}")]
    UnitMismatch {
        parameter: String,
        expected: String,
        actual: &'static str,
    },

    #[error("Unknown component type: {type_name}")]
    UnknownType { type_name: String },

    #[error("Component type {type_name} is already registered")]
    DuplicateType { type_name: String },

    #[error("Library {library} targets kernel {library_version}, this kernel is {kernel_version}")]
    IncompatibleLibrary {
        library: String,
        library_version: String,
        kernel_version: &'static str,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type ComponentResult<T> = Result<T, ComponentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ComponentError::Unconnected {
            component: "mass".into(),
            port: "P1".into(),
        };
        assert_eq!(err.to_string(), "Required port mass.P1 is not connected");
    }

    #[test]
    fn graph_errors_convert() {
        let err: ComponentError = GraphError::RegistrySealed.into();
        assert!(matches!(err, ComponentError::Graph(_)));
    }
}
