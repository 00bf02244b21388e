//! Struct declaration ordering
//!
//! Builds a directed graph over the structs of one generation group (edge
//! `A -> B` when a field of `A` has base type `B` and `B` is a struct of the
//! same group) and orders it with a depth-first post-order traversal, so
//! every struct is emitted after the structs it depends on.
//!
//! Cycles do not fail the resolution. An edge into a node that is still on
//! the traversal stack is a back-edge; it is logged, recorded in
//! [`Resolution::cycles`] and skipped. The order is then best effort for the
//! structs on that cycle: which edge gets dropped depends only on the
//! traversal order (roots and neighbours are visited in lexicographic order).
//!
//! # Example
//!
//! ```
//! use pacaller::dependency_resolver::DependencyResolver;
//! use pacaller::ir::{Field, Struct};
//!
//! let inner = Struct::new("inner", "net/x.c", vec![Field::new("v", "u32")]);
//! let outer = Struct::new("outer", "net/x.c", vec![Field::new("i", "inner")]);
//!
//! let resolution = DependencyResolver::new([&outer, &inner], []).resolve();
//! assert_eq!(resolution.order, vec!["inner", "outer"]);
//! assert!(resolution.cycles.is_empty());
//! ```

use crate::ir::Struct;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// A dependency edge that was dropped to break a cycle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CyclicEdge {
    pub from: String,
    pub to: String,
}

impl fmt::Display for CyclicEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Result of a resolution: definition order plus the back-edges that were
/// skipped to obtain it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub order: Vec<String>,
    pub cycles: Vec<CyclicEdge>,
}

impl Resolution {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Topological sorter over one group's structs
#[derive(Debug)]
pub struct DependencyResolver<'a> {
    structs: BTreeMap<&'a str, &'a Struct>,
    /// Non-struct resources of the group; part of the node universe, never traversed
    other_names: BTreeSet<&'a str>,
    graph: BTreeMap<&'a str, Vec<&'a str>>,
}

impl<'a> DependencyResolver<'a> {
    /// Create a resolver for a group
    ///
    /// # Arguments
    ///
    /// * `structs` - The group's structs
    /// * `other_names` - Names of the group's typedefs and constants
    pub fn new<S, O>(structs: S, other_names: O) -> Self
    where
        S: IntoIterator<Item = &'a Struct>,
        O: IntoIterator<Item = &'a str>,
    {
        let structs: BTreeMap<&'a str, &'a Struct> =
            structs.into_iter().map(|s| (s.name.as_str(), s)).collect();
        let other_names = other_names
            .into_iter()
            .filter(|n| !structs.contains_key(n))
            .collect();

        // Only dependencies on another struct of this group become edges;
        // primitives, typedefs and structs of other groups are dropped.
        let graph = structs
            .iter()
            .map(|(&name, s)| {
                let deps = s
                    .dependencies
                    .iter()
                    .map(String::as_str)
                    .filter(|dep| structs.contains_key(dep))
                    .collect();
                (name, deps)
            })
            .collect();

        Self {
            structs,
            other_names,
            graph,
        }
    }

    /// Number of nodes in the resolution universe (structs and other resources)
    pub fn universe_size(&self) -> usize {
        self.structs.len() + self.other_names.len()
    }

    pub fn node_count(&self) -> usize {
        self.graph.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.values().map(Vec::len).sum()
    }

    /// Structs that `name` depends on within the group
    pub fn dependencies_of(&self, name: &str) -> &[&'a str] {
        self.graph.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Compute a definition order for all structs of the group
    ///
    /// Every struct appears exactly once, including structs no edge reaches.
    pub fn resolve(&self) -> Resolution {
        tracing::debug!(
            "Resolving {} structs ({} edges, {} resources in universe)",
            self.node_count(),
            self.edge_count(),
            self.universe_size()
        );

        let mut marks: HashMap<&'a str, Mark> = HashMap::with_capacity(self.graph.len());
        let mut resolution = Resolution {
            order: Vec::with_capacity(self.graph.len()),
            cycles: Vec::new(),
        };

        for &name in self.graph.keys() {
            if !marks.contains_key(name) {
                self.visit(name, &mut marks, &mut resolution);
            }
        }

        tracing::debug!("Resolved dependency order for {} structs", resolution.order.len());
        resolution
    }

    /// Depth-first post-order walk from `root` on an explicit stack
    ///
    /// Each frame holds a node and the index of its next unvisited neighbour,
    /// so the walk visits nodes in the same order as a recursive one without
    /// its depth limit.
    fn visit(&self, root: &'a str, marks: &mut HashMap<&'a str, Mark>, resolution: &mut Resolution) {
        let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::InProgress);

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(&neighbor) = self.dependencies_of(node).get(frame.1) else {
                marks.insert(node, Mark::Done);
                resolution.order.push(node.to_string());
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match marks.get(neighbor) {
                Some(Mark::InProgress) => {
                    tracing::warn!("Cyclic dependency detected: {} -> {}", node, neighbor);
                    resolution.cycles.push(CyclicEdge {
                        from: node.to_string(),
                        to: neighbor.to_string(),
                    });
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(neighbor, Mark::InProgress);
                    stack.push((neighbor, 0));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Field;

    fn st(name: &str, field_types: &[&str]) -> Struct {
        let fields = field_types
            .iter()
            .enumerate()
            .map(|(i, ty)| Field::new(format!("f{}", i), *ty))
            .collect();
        Struct::new(name, "net/test.c", fields)
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_empty_group() {
        let resolution = DependencyResolver::new([], []).resolve();
        assert!(resolution.order.is_empty());
        assert!(!resolution.has_cycles());
    }

    #[test]
    fn test_independent_structs_sorted_by_name() {
        let c = st("c", &["u8"]);
        let a = st("a", &["u16"]);
        let b = st("b", &["u32"]);

        let resolution = DependencyResolver::new([&c, &a, &b], []).resolve();
        assert_eq!(resolution.order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_chain_orders_dependencies_first() {
        let a = st("a", &["b"]);
        let b = st("b", &["c *"]);
        let c = st("c", &["u8"]);

        let resolution = DependencyResolver::new([&a, &b, &c], []).resolve();
        assert_eq!(resolution.order, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_diamond() {
        let top = st("top", &["left", "right"]);
        let left = st("left", &["base"]);
        let right = st("right", &["base"]);
        let base = st("base", &["u32"]);

        let resolution = DependencyResolver::new([&top, &left, &right, &base], []).resolve();
        let order = &resolution.order;

        assert_eq!(order.len(), 4);
        assert!(position(order, "base") < position(order, "left"));
        assert!(position(order, "base") < position(order, "right"));
        assert!(position(order, "left") < position(order, "top"));
        assert!(position(order, "right") < position(order, "top"));
    }

    #[test]
    fn test_two_node_cycle_terminates() {
        let a = st("a", &["b *"]);
        let b = st("b", &["a *"]);

        let resolution = DependencyResolver::new([&a, &b], []).resolve();

        assert_eq!(resolution.order.len(), 2);
        assert!(resolution.order.contains(&"a".to_string()));
        assert!(resolution.order.contains(&"b".to_string()));
        assert_eq!(
            resolution.cycles,
            vec![CyclicEdge {
                from: "b".to_string(),
                to: "a".to_string()
            }]
        );
    }

    #[test]
    fn test_self_reference_is_not_a_cycle() {
        let list = st("list_head", &["list_head *", "list_head *"]);
        let resolution = DependencyResolver::new([&list], []).resolve();
        assert_eq!(resolution.order, vec!["list_head"]);
        assert!(!resolution.has_cycles());
    }

    #[test]
    fn test_unknown_and_non_struct_dependencies_dropped() {
        let a = st("a", &["sctp_assoc_t", "missing_struct", "u8"]);
        let resolver = DependencyResolver::new([&a], ["sctp_assoc_t"]);

        assert_eq!(resolver.edge_count(), 0);
        assert_eq!(resolver.universe_size(), 2);
        assert_eq!(resolver.resolve().order, vec!["a"]);
    }

    #[test]
    fn test_other_names_colliding_with_struct_not_double_counted() {
        let a = st("a", &["u8"]);
        let resolver = DependencyResolver::new([&a], ["a", "CONST_X"]);
        assert_eq!(resolver.universe_size(), 2);
    }

    #[test]
    fn test_cycle_with_tail() {
        // x -> y -> z -> y, and w independent
        let x = st("x", &["y"]);
        let y = st("y", &["z"]);
        let z = st("z", &["y"]);
        let w = st("w", &["u8"]);

        let resolution = DependencyResolver::new([&x, &y, &z, &w], []).resolve();
        let order = &resolution.order;

        assert_eq!(order.len(), 4);
        assert!(position(order, "y") < position(order, "x"));
        assert_eq!(resolution.cycles.len(), 1);
        assert_eq!(resolution.cycles[0].to_string(), "z -> y");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let a = st("a", &["b", "c"]);
        let b = st("b", &["c"]);
        let c = st("c", &["a"]);

        let first = DependencyResolver::new([&a, &b, &c], []).resolve();
        let second = DependencyResolver::new([&c, &b, &a], []).resolve();
        assert_eq!(first, second);
    }

    #[test]
    fn test_deep_chain_does_not_exhaust_stack() {
        // n000000 -> n000001 -> ... -> n049999, first root is the chain head
        let depth = 50_000;
        let structs: Vec<Struct> = (0..depth)
            .map(|i| {
                let ty = if i + 1 < depth {
                    format!("n{:06}", i + 1)
                } else {
                    "u8".to_string()
                };
                st(&format!("n{:06}", i), &[ty.as_str()])
            })
            .collect();

        let resolution = DependencyResolver::new(&structs, []).resolve();

        assert_eq!(resolution.order.len(), depth);
        assert_eq!(resolution.order[0], format!("n{:06}", depth - 1));
        assert_eq!(resolution.order[depth - 1], "n000000");
        assert!(!resolution.has_cycles());
    }
}
