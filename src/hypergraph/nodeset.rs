use std::fmt;
use std::hash::Hash;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Types usable as hypergraph nodes.
///
/// Nodes are opaque, caller-supplied identifiers; the store never assigns
/// identity to them. The `Ord` bound backs the canonical sorted form used by
/// [`NodeSet`].
pub trait Node: Clone + Eq + Hash + Ord + fmt::Debug {}

impl<T: Clone + Eq + Hash + Ord + fmt::Debug> Node for T {}

/// Canonical, order-independent collection of nodes.
///
/// Stored as a sorted, deduplicated vector, so two sets built from the same
/// nodes in any order hash and compare equal. This is the hashable key type
/// of the successor/predecessor maps and the canonical tail/head of every
/// hyperedge.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeSet<N: Node> {
    nodes: Vec<N>,
}

impl<N: Node> NodeSet<N> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: &N) -> bool {
        self.nodes.binary_search(node).is_ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, N> {
        self.nodes.iter()
    }

    /// The nodes in canonical (sorted) order.
    pub fn as_slice(&self) -> &[N] {
        &self.nodes
    }
}

impl<N: Node> FromIterator<N> for NodeSet<N> {
    fn from_iter<I: IntoIterator<Item = N>>(iter: I) -> Self {
        let mut nodes: Vec<N> = iter.into_iter().collect();
        nodes.sort();
        nodes.dedup();
        NodeSet { nodes }
    }
}

impl<N: Node> From<Vec<N>> for NodeSet<N> {
    fn from(nodes: Vec<N>) -> Self {
        nodes.into_iter().collect()
    }
}

impl<'a, N: Node> IntoIterator for &'a NodeSet<N> {
    type Item = &'a N;
    type IntoIter = std::slice::Iter<'a, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl<N: Node> IntoIterator for NodeSet<N> {
    type Item = N;
    type IntoIter = std::vec::IntoIter<N>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<N: Node> fmt::Debug for NodeSet<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(&self.nodes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::NodeSet;

    #[test]
    fn order_independent_equality_and_hashing() {
        let a: NodeSet<&str> = ["x", "y", "z"].into_iter().collect();
        let b: NodeSet<&str> = ["z", "x", "y", "x"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.as_slice(), &["x", "y", "z"]);

        let mut seen = std::collections::HashSet::new();
        seen.insert(a);
        assert!(seen.contains(&b));
    }

    #[test]
    fn contains_and_len() {
        let s: NodeSet<u32> = [3, 1, 2, 2].into_iter().collect();
        assert_eq!(s.len(), 3);
        assert!(s.contains(&2));
        assert!(!s.contains(&4));
        assert!(!s.is_empty());
        assert!(NodeSet::<u32>::from_iter([]).is_empty());
    }
}
