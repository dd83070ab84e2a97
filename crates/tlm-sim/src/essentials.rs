//! The driver: factories, registries and the shared message queue.
//!
//! Libraries are registered first. Creating the first component or system
//! seals both registries; from then on they are read-only.

use std::sync::Arc;

use tlm_components::{
    ComponentEntry, ComponentFactory, ComponentInstance, LibraryDescriptor, LibraryInfo, check_compatible,
};
use tlm_core::{Message, MessageHandler};
use tlm_graph::{GraphError, NodeTypeRegistry};

use crate::error::{SimError, SimResult};
use crate::system::ComponentSystem;

/// Libraries compiled into the kernel.
pub const BUILTIN_LIBRARIES: [LibraryDescriptor; 2] = [tlm_components::LIBRARY, tlm_controls::LIBRARY];

#[derive(Debug)]
pub struct Essentials {
    factory: ComponentFactory,
    registry: NodeTypeRegistry,
    sealed: Option<Arc<NodeTypeRegistry>>,
    libraries: Vec<LibraryInfo>,
    messages: MessageHandler,
}

impl Default for Essentials {
    fn default() -> Self {
        Self::new()
    }
}

impl Essentials {
    /// Driver with the built-in libraries loaded.
    pub fn new() -> Self {
        let mut essentials = Self::empty();
        for library in &BUILTIN_LIBRARIES {
            if let Err(e) = essentials.register_library(library) {
                essentials
                    .messages
                    .fatal(format!("Built-in library failed to load: {e}"), "library");
            }
        }
        essentials
    }

    /// Driver with no component libraries.
    pub fn empty() -> Self {
        Self {
            factory: ComponentFactory::new(),
            registry: NodeTypeRegistry::new(),
            sealed: None,
            libraries: Vec::new(),
            messages: MessageHandler::new(),
        }
    }

    /// Register a library's component and node types. Either all of them
    /// are added or none are.
    pub fn register_library(&mut self, library: &LibraryDescriptor) -> SimResult<()> {
        let info = (library.info)();
        let before = self.factory.len();
        let result = self.try_register(library, &info);
        match &result {
            Ok(()) => self.messages.info(
                format!(
                    "Loaded library {} ({} component types)",
                    info.name,
                    self.factory.len() - before
                ),
                "library",
            ),
            Err(e) => self.messages.error(e.to_string(), "library"),
        }
        result
    }

    fn try_register(&mut self, library: &LibraryDescriptor, info: &LibraryInfo) -> SimResult<()> {
        if self.sealed.is_some() {
            return Err(GraphError::RegistrySealed.into());
        }
        if self.libraries.iter().any(|l| l.name == info.name) {
            return Err(SimError::DuplicateLibrary {
                name: info.name.to_string(),
            });
        }
        check_compatible(info)?;
        let mut factory = self.factory.clone();
        let mut registry = self.registry.clone();
        (library.register)(&mut factory, &mut registry)?;
        self.factory = factory;
        self.registry = registry;
        self.libraries.push(info.clone());
        Ok(())
    }

    fn seal(&mut self) -> Arc<NodeTypeRegistry> {
        if let Some(sealed) = &self.sealed {
            return Arc::clone(sealed);
        }
        self.registry.seal();
        let sealed = Arc::new(self.registry.clone());
        self.sealed = Some(Arc::clone(&sealed));
        self.messages.debug("Registries sealed", "library");
        sealed
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.is_some()
    }

    pub fn create_component(&mut self, type_name: &str) -> SimResult<ComponentInstance> {
        self.seal();
        match self.factory.create(type_name) {
            Ok(component) => Ok(component),
            Err(e) => {
                let e = SimError::from(e);
                self.messages.error(e.to_string(), "create");
                Err(e)
            }
        }
    }

    /// Empty system sharing this driver's registries and message queue.
    pub fn create_component_system(&mut self) -> ComponentSystem {
        let registry = self.seal();
        ComponentSystem::with_context("System", registry, self.messages.clone())
    }

    /// Registered component types in type-name order.
    pub fn component_types(&self) -> impl Iterator<Item = &ComponentEntry> {
        self.factory.entries()
    }

    pub fn has_component_type(&self, type_name: &str) -> bool {
        self.factory.contains(type_name)
    }

    pub fn libraries(&self) -> &[LibraryInfo] {
        &self.libraries
    }

    pub fn registry(&self) -> &NodeTypeRegistry {
        &self.registry
    }

    pub fn messages(&self) -> &MessageHandler {
        &self.messages
    }

    /// Number of undrained messages.
    pub fn check_message(&self) -> usize {
        self.messages.check_message()
    }

    pub fn get_message(&self) -> Option<Message> {
        self.messages.get_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlm_components::{ComponentError, ComponentResult};
    use tlm_core::KERNEL_VERSION;

    fn extra_info() -> LibraryInfo {
        LibraryInfo {
            name: "extra",
            kernel_version: KERNEL_VERSION,
        }
    }

    fn register_nothing(_: &mut ComponentFactory, _: &mut NodeTypeRegistry) -> ComponentResult<()> {
        Ok(())
    }

    fn register_then_fail(factory: &mut ComponentFactory, _: &mut NodeTypeRegistry) -> ComponentResult<()> {
        factory.register::<tlm_controls::Gain>()
    }

    const EXTRA: LibraryDescriptor = LibraryDescriptor {
        info: extra_info,
        register: register_nothing,
    };

    #[test]
    fn builtins_are_loaded() {
        let essentials = Essentials::new();
        assert_eq!(essentials.libraries().len(), 2);
        assert!(essentials.has_component_type("MechanicTranslationalMass"));
        assert!(essentials.has_component_type("SignalMax"));
        assert!(!essentials.messages().has_errors());
    }

    #[test]
    fn registering_twice_is_rejected() {
        let mut essentials = Essentials::new();
        let err = essentials.register_library(&tlm_controls::LIBRARY).unwrap_err();
        assert!(matches!(err, SimError::DuplicateLibrary { .. }));
        assert!(essentials.messages().has_errors());
    }

    #[test]
    fn failed_registration_leaves_the_factory_untouched() {
        let mut essentials = Essentials::new();
        let before = essentials.component_types().count();
        let bad = LibraryDescriptor {
            info: extra_info,
            register: register_then_fail,
        };
        let err = essentials.register_library(&bad).unwrap_err();
        assert!(matches!(err, SimError::Component(ComponentError::DuplicateType { .. })));
        assert_eq!(essentials.component_types().count(), before);
        assert!(essentials.libraries().iter().all(|l| l.name != "extra"));
    }

    #[test]
    fn registries_seal_on_first_model() {
        let mut essentials = Essentials::new();
        let _system = essentials.create_component_system();
        assert!(essentials.is_sealed());
        let err = essentials.register_library(&EXTRA).unwrap_err();
        assert_eq!(err, SimError::Graph(GraphError::RegistrySealed));
    }

    #[test]
    fn unknown_type_fails_with_a_message() {
        let mut essentials = Essentials::new();
        essentials.messages().clear();
        assert!(essentials.create_component("NoSuchThing").is_err());
        assert_eq!(essentials.check_message(), 2);
        let _sealed = essentials.get_message();
        let message = essentials.get_message().unwrap();
        assert!(message.text.contains("NoSuchThing"));
    }
}
