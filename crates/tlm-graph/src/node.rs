//! Node types and their slot tables.
//!
//! Every node type has a fixed, ordered list of `f64` slots. Built-in types
//! get a typed slot enum so components address slots without strings;
//! runtime-registered types are addressed with [`RawSlot`].

use crate::error::{GraphError, GraphResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeType {
    Signal,
    Hydraulic,
    Mechanic,
    MechanicRotational,
    Electric,
    /// Registered at runtime; the number is its registry position.
    Custom(u16),
}

impl NodeType {
    pub const BUILTIN: [NodeType; 5] = [
        NodeType::Signal,
        NodeType::Hydraulic,
        NodeType::Mechanic,
        NodeType::MechanicRotational,
        NodeType::Electric,
    ];

    /// Canonical name of a built-in type, `None` for custom types.
    pub fn builtin_name(self) -> Option<&'static str> {
        match self {
            NodeType::Signal => Some("NodeSignal"),
            NodeType::Hydraulic => Some("NodeHydraulic"),
            NodeType::Mechanic => Some("NodeMechanic"),
            NodeType::MechanicRotational => Some("NodeMechanicRotational"),
            NodeType::Electric => Some("NodeElectric"),
            NodeType::Custom(_) => None,
        }
    }

    pub fn is_signal(self) -> bool {
        self == NodeType::Signal
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.builtin_name() {
            Some(name) => f.write_str(name),
            None => match self {
                NodeType::Custom(id) => write!(f, "NodeCustom#{}", id),
                _ => Ok(()),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariableCategory {
    Flow,
    Intensity,
    Tlm,
    Default,
    Hidden,
}

/// One slot of a node type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataDescription {
    pub name: String,
    pub short_name: String,
    pub unit: String,
    pub category: VariableCategory,
    pub default: f64,
    pub index: usize,
}

impl DataDescription {
    pub fn new(
        name: &str,
        short_name: &str,
        unit: &str,
        category: VariableCategory,
        default: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            short_name: short_name.to_string(),
            unit: unit.to_string(),
            category,
            default,
            index: 0,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.short_name == name
    }
}

/// A slot name that knows which node type it belongs to.
pub trait NodeSlot: Copy {
    fn node_type(self) -> NodeType;
    fn index(self) -> usize;

    /// Value of the slot on a freshly created node.
    fn default_value(self) -> f64 {
        0.0
    }
}

struct SlotSpec {
    name: &'static str,
    short: &'static str,
    unit: &'static str,
    category: VariableCategory,
    default: f64,
}

macro_rules! node_slots {
    (
        $(#[$meta:meta])*
        $name:ident => $node_type:expr,
        [$($var:ident = ($long:literal, $short:literal, $unit:literal, $cat:ident, $def:expr)),+ $(,)?]
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($var),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$var),+];

            const SPECS: &'static [SlotSpec] = &[
                $(SlotSpec {
                    name: $long,
                    short: $short,
                    unit: $unit,
                    category: VariableCategory::$cat,
                    default: $def,
                }),+
            ];
        }

        impl NodeSlot for $name {
            #[inline]
            fn node_type(self) -> NodeType {
                $node_type
            }

            #[inline]
            fn index(self) -> usize {
                self as usize
            }

            fn default_value(self) -> f64 {
                Self::SPECS[self as usize].default
            }
        }
    };
}

node_slots! {
    SignalSlot => NodeType::Signal,
    [Value = ("Value", "y", "-", Default, 0.0)]
}

node_slots! {
    HydraulicSlot => NodeType::Hydraulic,
    [
        Flow = ("Flow", "q", "m^3/s", Flow, 0.0),
        Pressure = ("Pressure", "p", "Pa", Intensity, 1e5),
        Temperature = ("Temperature", "T", "K", Default, 293.0),
        WaveVariable = ("WaveVariable", "c", "Pa", Tlm, 1e5),
        CharImpedance = ("CharImpedance", "Zc", "Pa s/m^3", Tlm, 0.0),
        HeatFlow = ("HeatFlow", "Qdot", "W", Hidden, 0.0),
    ]
}

node_slots! {
    MechanicSlot => NodeType::Mechanic,
    [
        Velocity = ("Velocity", "v", "m/s", Flow, 0.0),
        Force = ("Force", "f", "N", Intensity, 0.0),
        Position = ("Position", "x", "m", Default, 0.0),
        WaveVariable = ("WaveVariable", "c", "N", Tlm, 0.0),
        CharImpedance = ("CharImpedance", "Zc", "N s/m", Tlm, 0.0),
        EquivalentMass = ("EquivalentMass", "me", "kg", Hidden, 1.0),
    ]
}

node_slots! {
    RotationalSlot => NodeType::MechanicRotational,
    [
        AngularVelocity = ("AngularVelocity", "w", "rad/s", Flow, 0.0),
        Torque = ("Torque", "T", "Nm", Intensity, 0.0),
        Angle = ("Angle", "a", "rad", Default, 0.0),
        WaveVariable = ("WaveVariable", "c", "Nm", Tlm, 0.0),
        CharImpedance = ("CharImpedance", "Zc", "Nm s/rad", Tlm, 0.0),
        EquivalentInertia = ("EquivalentInertia", "Je", "kg m^2", Hidden, 1.0),
    ]
}

node_slots! {
    ElectricSlot => NodeType::Electric,
    [
        Voltage = ("Voltage", "U", "V", Intensity, 0.0),
        Current = ("Current", "i", "A", Flow, 0.0),
        WaveVariable = ("WaveVariable", "c", "V", Tlm, 0.0),
        CharImpedance = ("CharImpedance", "Zc", "V/A", Tlm, 0.0),
    ]
}

/// Slot of any node type by position, for runtime-registered node types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawSlot {
    pub node_type: NodeType,
    pub index: usize,
}

impl NodeSlot for RawSlot {
    fn node_type(self) -> NodeType {
        self.node_type
    }

    fn index(self) -> usize {
        self.index
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeTypeInfo {
    pub node_type: NodeType,
    pub name: String,
    pub descriptions: Vec<DataDescription>,
}

/// All node types known to a kernel instance.
///
/// Built-in types are always present. Custom types may be added until the
/// registry is sealed, after which it is read-only.
#[derive(Clone, Debug)]
pub struct NodeTypeRegistry {
    types: Vec<NodeTypeInfo>,
    sealed: bool,
}

fn from_specs(specs: &[SlotSpec]) -> Vec<DataDescription> {
    specs
        .iter()
        .enumerate()
        .map(|(index, s)| DataDescription {
            index,
            ..DataDescription::new(s.name, s.short, s.unit, s.category, s.default)
        })
        .collect()
}

impl Default for NodeTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTypeRegistry {
    pub fn new() -> Self {
        let builtin = |node_type: NodeType, specs: &[SlotSpec]| NodeTypeInfo {
            node_type,
            name: node_type.to_string(),
            descriptions: from_specs(specs),
        };
        Self {
            types: vec![
                builtin(NodeType::Signal, SignalSlot::SPECS),
                builtin(NodeType::Hydraulic, HydraulicSlot::SPECS),
                builtin(NodeType::Mechanic, MechanicSlot::SPECS),
                builtin(NodeType::MechanicRotational, RotationalSlot::SPECS),
                builtin(NodeType::Electric, ElectricSlot::SPECS),
            ],
            sealed: false,
        }
    }

    pub fn register_custom(
        &mut self,
        name: &str,
        descriptions: Vec<DataDescription>,
    ) -> GraphResult<NodeType> {
        if self.sealed {
            return Err(GraphError::RegistrySealed);
        }
        if self.lookup(name).is_some() {
            return Err(GraphError::DuplicateNodeType {
                name: name.to_string(),
            });
        }
        let custom_count = self.types.len() - NodeType::BUILTIN.len();
        let node_type = NodeType::Custom(custom_count as u16);
        let descriptions = descriptions
            .into_iter()
            .enumerate()
            .map(|(index, d)| DataDescription { index, ..d })
            .collect();
        self.types.push(NodeTypeInfo {
            node_type,
            name: name.to_string(),
            descriptions,
        });
        Ok(node_type)
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn info(&self, node_type: NodeType) -> Option<&NodeTypeInfo> {
        self.types.iter().find(|t| t.node_type == node_type)
    }

    pub fn lookup(&self, name: &str) -> Option<NodeType> {
        self.types
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.node_type)
    }

    pub fn name(&self, node_type: NodeType) -> String {
        self.info(node_type)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| node_type.to_string())
    }

    /// Slot table of a type; empty for unknown types.
    pub fn descriptions(&self, node_type: NodeType) -> &[DataDescription] {
        self.info(node_type)
            .map(|t| t.descriptions.as_slice())
            .unwrap_or(&[])
    }

    /// Slot position by long or short name.
    pub fn slot_index(&self, node_type: NodeType, slot: &str) -> GraphResult<usize> {
        self.descriptions(node_type)
            .iter()
            .find(|d| d.matches(slot))
            .map(|d| d.index)
            .ok_or_else(|| GraphError::UnknownSlot {
                node_type: self.name(node_type),
                slot: slot.to_string(),
            })
    }

    pub fn node_types(&self) -> impl Iterator<Item = &NodeTypeInfo> {
        self.types.iter()
    }
}
