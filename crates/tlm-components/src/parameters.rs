//! Component parameters.
//!
//! Parameters are owned by the framework, not by the component model. A
//! model holds a [`ParamHandle`] and reads the value once during
//! initialization. A parameter may be bound to a named system parameter,
//! in which case its value is resolved when the owning system initializes.

use tlm_core::units::SiQuantity;

use crate::common::check_finite;
use crate::error::{ComponentError, ComponentResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamHandle(pub(crate) usize);

#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub description: String,
    pub unit: String,
    pub default: f64,
    pub value: f64,
    /// Name of the system parameter this value follows, if any.
    pub binding: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    owner: String,
    entries: Vec<Parameter>,
}

impl Parameters {
    pub(crate) fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        self.owner = owner.to_string();
    }

    pub(crate) fn add(&mut self, name: &str, description: &str, unit: &str, default: f64) -> ParamHandle {
        self.entries.push(Parameter {
            name: name.to_string(),
            description: description.to_string(),
            unit: unit.to_string(),
            default,
            value: default,
            binding: None,
        });
        ParamHandle(self.entries.len() - 1)
    }

    fn position(&self, name: &str) -> ComponentResult<usize> {
        self.entries
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ComponentError::UnknownParameter {
                component: self.owner.clone(),
                parameter: name.to_string(),
            })
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.entries.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn value(&self, handle: ParamHandle) -> f64 {
        self.entries[handle.0].value
    }

    pub fn set_value(&mut self, name: &str, value: f64) -> ComponentResult<()> {
        let index = self.position(name)?;
        check_finite(value, name)?;
        let param = &mut self.entries[index];
        param.value = value;
        param.binding = None;
        Ok(())
    }

    /// Set from a typed quantity; the quantity's unit must match the
    /// parameter's declared unit.
    pub fn set_quantity<Q: SiQuantity>(&mut self, name: &str, quantity: Q) -> ComponentResult<()> {
        let index = self.position(name)?;
        if self.entries[index].unit != Q::UNIT {
            return Err(ComponentError::UnitMismatch {
                parameter: name.to_string(),
                expected: self.entries[index].unit.clone(),
                actual: Q::UNIT,
            });
        }
        self.set_value(name, quantity.si_value())
    }

    /// Make `name` follow the system parameter `system_parameter`.
    pub fn bind(&mut self, name: &str, system_parameter: &str) -> ComponentResult<()> {
        let index = self.position(name)?;
        self.entries[index].binding = Some(system_parameter.to_string());
        Ok(())
    }

    /// Copy bound system parameter values in. Returns the name of the first
    /// binding `lookup` cannot resolve.
    pub fn resolve(&mut self, lookup: impl Fn(&str) -> Option<f64>) -> Result<(), String> {
        for param in &mut self.entries {
            if let Some(binding) = &param.binding {
                match lookup(binding) {
                    Some(value) => param.value = value,
                    None => return Err(binding.clone()),
                }
            }
        }
        Ok(())
    }

    /// First parameter holding a non-finite value.
    pub fn check_finite(&self) -> ComponentResult<()> {
        for p in &self.entries {
            check_finite(p.value, &p.name)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlm_core::units::{meter, newton};

    fn params() -> (Parameters, ParamHandle) {
        let mut p = Parameters::new("spring");
        let k = p.add("k", "Spring coefficient", "N/m", 100.0);
        p.add("F", "Preload", "N", 0.0);
        (p, k)
    }

    #[test]
    fn set_and_read_back() {
        let (mut p, k) = params();
        assert_eq!(p.value(k), 100.0);
        p.set_value("k", 250.0).unwrap();
        assert_eq!(p.value(k), 250.0);
        assert!(p.set_value("k", f64::NAN).is_err());
        assert!(matches!(
            p.set_value("missing", 1.0),
            Err(ComponentError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn quantities_check_units() {
        let (mut p, _) = params();
        p.set_quantity("F", newton(12.0)).unwrap();
        assert_eq!(p.get("F").unwrap().value, 12.0);
        assert!(matches!(
            p.set_quantity("F", meter(1.0)),
            Err(ComponentError::UnitMismatch { .. })
        ));
    }

    #[test]
    fn bindings_resolve_from_lookup() {
        let (mut p, k) = params();
        p.bind("k", "stiffness").unwrap();
        p.resolve(|name| (name == "stiffness").then_some(5e3)).unwrap();
        assert_eq!(p.value(k), 5e3);
        assert_eq!(p.resolve(|_| None), Err("stiffness".to_string()));
        p.set_value("k", 1.0).unwrap();
        assert!(p.get("k").unwrap().binding.is_none());
    }
}
