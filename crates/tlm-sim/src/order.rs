//! Execution order of the members of one system.
//!
//! Members are grouped by causality (S, then C, then Q) and each group is
//! sorted topologically over its signal dependencies. The order is
//! computed once per initialization and reused every step.

use std::collections::BTreeSet;

use tlm_core::NodeId;

/// Nodes one member touches through its signal ports.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Access {
    pub writes: Vec<NodeId>,
    pub reads: Vec<NodeId>,
    /// Reads that must observe the value from the end of the previous step.
    pub delayed_reads: Vec<NodeId>,
}

impl Access {
    pub fn extend(&mut self, other: Access) {
        self.writes.extend(other.writes);
        self.reads.extend(other.reads);
        self.delayed_reads.extend(other.delayed_reads);
    }
}

/// Ordering edges `(before, after)` between members.
///
/// A writer runs before its readers. A delayed reader runs before the
/// writer of the node it reads, so it still sees last step's value.
pub(crate) fn dependencies(access: &[Access]) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for (w, writer) in access.iter().enumerate() {
        for (r, reader) in access.iter().enumerate() {
            if w == r {
                continue;
            }
            if writer.writes.iter().any(|n| reader.reads.contains(n)) {
                edges.push((w, r));
            }
            if writer.writes.iter().any(|n| reader.delayed_reads.contains(n)) {
                edges.push((r, w));
            }
        }
    }
    edges
}

/// Kahn's algorithm over `count` members. Ready members are taken lowest
/// index first, so unrelated members keep their insertion order.
///
/// On a cycle, returns the members that could not be scheduled.
pub(crate) fn evaluation_order(count: usize, edges: &[(usize, usize)]) -> Result<Vec<usize>, Vec<usize>> {
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut in_degree = vec![0usize; count];
    for &(from, to) in edges {
        adj[from].push(to);
        in_degree[to] += 1;
    }

    let mut ready: BTreeSet<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(count);
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &to in &adj[next] {
            in_degree[to] -= 1;
            if in_degree[to] == 0 {
                ready.insert(to);
            }
        }
    }

    if order.len() == count {
        Ok(order)
    } else {
        Err((0..count).filter(|i| !order.contains(i)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(i: u32) -> NodeId {
        NodeId::from_index(i)
    }

    #[test]
    fn independent_members_keep_insertion_order() {
        assert_eq!(evaluation_order(4, &[]).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn writers_run_before_readers() {
        // 0 reads what 2 writes, 2 reads what 1 writes
        let edges = [(2, 0), (1, 2)];
        assert_eq!(evaluation_order(3, &edges).unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn cycle_reports_blocked_members() {
        let edges = [(0, 1), (1, 0), (1, 2)];
        assert_eq!(evaluation_order(4, &edges).unwrap_err(), vec![0, 1, 2]);
    }

    #[test]
    fn delayed_read_reverses_the_edge() {
        let access = vec![
            Access {
                writes: vec![node(0)],
                ..Access::default()
            },
            Access {
                delayed_reads: vec![node(0)],
                writes: vec![node(1)],
                ..Access::default()
            },
            Access {
                reads: vec![node(1)],
                ..Access::default()
            },
        ];
        let edges = dependencies(&access);
        assert_eq!(edges, vec![(1, 0), (1, 2)]);
        assert_eq!(evaluation_order(3, &edges).unwrap(), vec![1, 0, 2]);
    }

    #[test]
    fn self_dependencies_are_ignored() {
        let access = vec![Access {
            writes: vec![node(3)],
            reads: vec![node(3)],
            delayed_reads: vec![],
        }];
        assert!(dependencies(&access).is_empty());
    }
}
