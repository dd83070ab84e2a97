//! Component factory and library registration.
//!
//! A library is a [`LibraryDescriptor`]: one function that registers its
//! component types (and any custom node types), and one that reports its
//! name and the kernel version it was built against.

use std::collections::BTreeMap;

use tlm_core::KERNEL_VERSION;
use tlm_graph::{Cqs, NodeTypeRegistry};

use crate::context::Configure;
use crate::error::{ComponentError, ComponentResult};
use crate::instance::{ComponentInstance, Creator};
use crate::traits::{Component, ComponentType};

pub(crate) fn create<T: ComponentType>(cfg: &mut Configure<'_>) -> Box<dyn Component> {
    Box::new(T::configure(cfg))
}

#[derive(Clone, Copy)]
pub struct ComponentEntry {
    pub type_name: &'static str,
    pub cqs: Cqs,
    pub description: &'static str,
    pub create: Creator,
}

impl ComponentEntry {
    pub fn of<T: ComponentType>() -> Self {
        Self {
            type_name: T::TYPE_NAME,
            cqs: T::CQS,
            description: T::DESCRIPTION,
            create: create::<T>,
        }
    }
}

impl std::fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("type_name", &self.type_name)
            .field("cqs", &self.cqs)
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ComponentFactory {
    entries: BTreeMap<&'static str, ComponentEntry>,
}

impl ComponentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: ComponentType>(&mut self) -> ComponentResult<()> {
        self.register_entry(ComponentEntry::of::<T>())
    }

    pub fn register_entry(&mut self, entry: ComponentEntry) -> ComponentResult<()> {
        if self.entries.contains_key(entry.type_name) {
            return Err(ComponentError::DuplicateType {
                type_name: entry.type_name.to_string(),
            });
        }
        tracing::trace!(type_name = entry.type_name, cqs = entry.cqs.as_str(), "registered component type");
        self.entries.insert(entry.type_name, entry);
        Ok(())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    pub fn entry(&self, type_name: &str) -> Option<&ComponentEntry> {
        self.entries.get(type_name)
    }

    /// New instance named after its type.
    pub fn create(&self, type_name: &str) -> ComponentResult<ComponentInstance> {
        let entry = self
            .entries
            .get(type_name)
            .ok_or_else(|| ComponentError::UnknownType {
                type_name: type_name.to_string(),
            })?;
        ComponentInstance::with_creator(entry.type_name, entry.type_name, entry.cqs, entry.create)
    }

    /// Registered entries in type-name order.
    pub fn entries(&self) -> impl Iterator<Item = &ComponentEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryInfo {
    pub name: &'static str,
    pub kernel_version: &'static str,
}

/// The two entry points a component library exposes.
#[derive(Clone, Copy)]
pub struct LibraryDescriptor {
    pub info: fn() -> LibraryInfo,
    pub register: fn(&mut ComponentFactory, &mut NodeTypeRegistry) -> ComponentResult<()>,
}

fn major_minor(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.trim().parse().ok()?;
    let minor = parts.next()?.trim().parse().ok()?;
    Some((major, minor))
}

/// Libraries are compatible when major and minor versions match.
pub fn check_compatible(info: &LibraryInfo) -> ComponentResult<()> {
    match (major_minor(info.kernel_version), major_minor(KERNEL_VERSION)) {
        (Some(lib), Some(kernel)) if lib == kernel => Ok(()),
        _ => Err(ComponentError::IncompatibleLibrary {
            library: info.name.to_string(),
            library_version: info.kernel_version.to_string(),
            kernel_version: KERNEL_VERSION,
        }),
    }
}
