//! Flattening a system hierarchy into one node arena.
//!
//! Every port of every leaf component, every multi-port connection and
//! every system port becomes a terminal. Connections merge terminals with a
//! union-find; each merged group holding at least one leaf port and more
//! than one terminal becomes a node. System ports never own data, so a
//! node that crosses a subsystem boundary is shared by the ports on both
//! sides.

use std::collections::HashMap;

use tlm_graph::{
    Cqs, DisjointSet, NodeCheck, NodeData, NodeTypeRegistry, PortBinding, PortDecl, Terminal,
    check_node,
};

use crate::error::{SimError, SimResult};
use crate::system::{ComponentSystem, Endpoint, Located, Member};

/// Position of a member in the hierarchy, as member indices from the root.
pub(crate) type Path = Vec<usize>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Key {
    Port { path: Path, port: usize },
    SubPort { path: Path, port: usize, sub: usize },
    SystemPort { path: Path, port: usize },
}

impl Key {
    fn path(&self) -> &[usize] {
        match self {
            Key::Port { path, .. } | Key::SubPort { path, .. } | Key::SystemPort { path, .. } => path,
        }
    }
}

struct Entry {
    key: Key,
    /// `None` for system ports.
    terminal: Option<Terminal>,
}

pub(crate) struct Network {
    pub nodes: NodeData,
    /// Port bindings of every leaf component.
    pub bindings: HashMap<Path, Vec<PortBinding>>,
    /// Causality of every subsystem with power ports at its boundary.
    pub subsystem_cqs: HashMap<Path, Cqs>,
}

#[derive(Default)]
struct Collector {
    set: DisjointSet,
    entries: Vec<Entry>,
    index: HashMap<Key, usize>,
    multi_count: HashMap<(Path, usize), usize>,
    subsystems: HashMap<Path, String>,
}

fn terminal(label: String, decl: &PortDecl, cqs: Cqs) -> Terminal {
    let terminal = Terminal::new(label, decl.kind, decl.node_type);
    if decl.kind.is_power() {
        terminal.with_cqs(cqs)
    } else {
        terminal
    }
}

impl Collector {
    fn entry(&mut self, key: Key, terminal: Option<Terminal>) -> usize {
        if let Some(&existing) = self.index.get(&key) {
            return existing;
        }
        let id = self.set.push();
        self.index.insert(key.clone(), id);
        self.entries.push(Entry { key, terminal });
        id
    }

    fn visit(&mut self, system: &ComponentSystem, path: &mut Path, prefix: &str) -> SimResult<()> {
        for (j, member) in system.members().iter().enumerate() {
            path.push(j);
            match member {
                Member::Component(c) => {
                    for (k, decl) in c.ports().iter().enumerate() {
                        if !decl.kind.is_multi() {
                            let label = format!("{prefix}{}.{}", c.name(), decl.name);
                            let key = Key::Port {
                                path: path.clone(),
                                port: k,
                            };
                            self.entry(key, Some(terminal(label, decl, c.cqs())));
                        }
                    }
                }
                Member::System(sub) => {
                    let label = format!("{prefix}{}", sub.name());
                    self.subsystems.insert(path.clone(), label.clone());
                    self.visit(sub, path, &format!("{label}/"))?;
                }
            }
            path.pop();
        }

        for connection in system.connections() {
            let a = self.endpoint(system, path, prefix, &connection.a)?;
            let b = self.endpoint(system, path, prefix, &connection.b)?;
            self.set.union(a, b);
        }
        Ok(())
    }

    fn endpoint(&mut self, system: &ComponentSystem, path: &Path, prefix: &str, e: &Endpoint) -> SimResult<usize> {
        match system.locate(e)? {
            Located::OwnPort(port) => Ok(self.entry(
                Key::SystemPort {
                    path: path.clone(),
                    port,
                },
                None,
            )),
            Located::Member { member, port } => {
                let mut inner = path.clone();
                inner.push(member);
                match &system.members()[member] {
                    Member::System(_) => Ok(self.entry(Key::SystemPort { path: inner, port }, None)),
                    Member::Component(c) => {
                        let decl = &c.ports()[port];
                        let label = format!("{prefix}{}.{}", c.name(), decl.name);
                        let key = if decl.kind.is_multi() {
                            let count = self.multi_count.entry((inner.clone(), port)).or_insert(0);
                            let sub = *count;
                            *count += 1;
                            Key::SubPort {
                                path: inner,
                                port,
                                sub,
                            }
                        } else {
                            Key::Port { path: inner, port }
                        };
                        Ok(self.entry(key, Some(terminal(label, decl, c.cqs()))))
                    }
                }
            }
        }
    }
}

/// Check the whole hierarchy below `root` and lay out its nodes.
pub(crate) fn flatten(root: &ComponentSystem, registry: &NodeTypeRegistry) -> SimResult<Network> {
    let mut collector = Collector::default();
    collector.visit(root, &mut Vec::new(), "")?;
    let Collector {
        mut set,
        entries,
        subsystems,
        ..
    } = collector;

    let mut nodes = NodeData::new();
    let mut node_of = vec![None; entries.len()];
    for group in set.groups() {
        if group.len() < 2 {
            continue;
        }
        let terminals: Vec<Terminal> = group
            .iter()
            .filter_map(|&e| entries[e].terminal.clone())
            .collect();
        if terminals.is_empty() {
            continue;
        }
        let Some(node_type) = check_node(&terminals, NodeCheck::Complete)? else {
            continue;
        };
        let node = nodes.add_node(node_type, registry.descriptions(node_type));
        for &e in &group {
            node_of[e] = Some(node);
        }
    }

    let mut bindings: HashMap<Path, Vec<PortBinding>> = HashMap::new();
    for (entry, node) in entries.iter().zip(&node_of) {
        let Some(node) = *node else { continue };
        let (path, port) = match &entry.key {
            Key::Port { path, port } | Key::SubPort { path, port, .. } => (path, *port),
            Key::SystemPort { .. } => continue,
        };
        let ports = bindings.entry(path.clone()).or_default();
        if ports.len() <= port {
            ports.resize(port + 1, PortBinding::Unconnected);
        }
        match (&entry.key, &mut ports[port]) {
            (Key::SubPort { .. }, PortBinding::Multi(subs)) => subs.push(node),
            (Key::SubPort { .. }, binding) => *binding = PortBinding::Multi(vec![node]),
            (_, binding) => *binding = PortBinding::Single(node),
        }
    }

    let subsystem_cqs = subsystem_causality(&mut set, &entries, &subsystems)?;
    Ok(Network {
        nodes,
        bindings,
        subsystem_cqs,
    })
}

/// A subsystem is C or Q when every power port reached from its system
/// ports from the inside has that causality.
fn subsystem_causality(
    set: &mut DisjointSet,
    entries: &[Entry],
    subsystems: &HashMap<Path, String>,
) -> SimResult<HashMap<Path, Cqs>> {
    let mut power_by_root: HashMap<usize, Vec<usize>> = HashMap::new();
    for (e, entry) in entries.iter().enumerate() {
        if let Some(t) = &entry.terminal
            && t.kind.is_power()
        {
            power_by_root.entry(set.find(e)).or_default().push(e);
        }
    }

    let mut seen: HashMap<Path, (bool, bool)> = HashMap::new();
    for (e, entry) in entries.iter().enumerate() {
        let Key::SystemPort { path, .. } = &entry.key else { continue };
        if path.is_empty() {
            continue;
        }
        let flags = seen.entry(path.clone()).or_default();
        for &p in power_by_root.get(&set.find(e)).map(Vec::as_slice).unwrap_or(&[]) {
            let inside = entries[p].key.path().starts_with(path);
            match entries[p].terminal.as_ref().and_then(|t| t.cqs) {
                Some(Cqs::C) if inside => flags.0 = true,
                Some(Cqs::Q) if inside => flags.1 = true,
                _ => {}
            }
        }
    }

    let mut result = HashMap::new();
    for (path, flags) in seen {
        let cqs = match flags {
            (true, true) => {
                return Err(SimError::UndefinedCqs {
                    system: subsystems.get(&path).cloned().unwrap_or_default(),
                });
            }
            (true, false) => Cqs::C,
            (false, true) => Cqs::Q,
            (false, false) => Cqs::S,
        };
        result.insert(path, cqs);
    }
    Ok(result)
}
