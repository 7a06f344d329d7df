//! Reachability over directed hypergraphs.
//!
//! Three traversal regimes, in increasing strictness of what it takes to
//! cross a hyperedge:
//!
//! - [`visit`]: a hyperedge fires the first time *any* of its tail nodes is
//!   reached.
//! - [`b_visit`]: a hyperedge fires only once *all* of its tail nodes have
//!   been reached, tracked with a per-hyperedge arrival counter. This models
//!   "all prerequisites satisfied" semantics. [`f_visit`] is the same on the
//!   symmetric image.
//! - The restrictive variants ([`restrictive_b_visit`],
//!   [`restrictive_f_visit`]) run from a set of sources and classify the
//!   hyperedges they touch, which feeds [`b_relaxation`]: for each node, the
//!   minimum number of all-tails constraints that must be waived before it
//!   becomes reachable.

use std::collections::VecDeque;

use ahash::AHashMap;

use crate::hypergraph::nodeset::{Node, NodeSet};
use crate::hypergraph::{DirectedHypergraph, EdgeId, HypergraphError, Map, Set};

use super::Orientation;

/// Result of a [`visit`] traversal.
///
/// Both predecessor maps are complete: every node and every hyperedge of the
/// input appears, mapped to `None` when it was never reached or fired.
#[derive(Clone, Debug)]
pub struct VisitOutcome<N: Node> {
    /// Nodes reached from the source, source included, in discovery order.
    pub visited: Set<N>,
    /// For each node, the hyperedge that first reached it.
    pub node_predecessor: Map<N, Option<EdgeId>>,
    /// For each hyperedge, the node whose arrival first fired it.
    pub edge_predecessor: Map<EdgeId, Option<N>>,
}

/// Result of a [`b_visit`] or [`f_visit`] traversal.
#[derive(Clone, Debug)]
pub struct BVisitOutcome<N: Node> {
    /// Nodes reached from the source, source included, in discovery order.
    pub visited: Set<N>,
    /// For each node, the hyperedge that first reached it.
    pub node_predecessor: Map<N, Option<EdgeId>>,
    /// For each hyperedge, the node whose arrival completed its tail.
    pub edge_predecessor: Map<EdgeId, Option<N>>,
    /// Hyperedge hops from the source: `Some(0)` for the source, `None` for
    /// unreached nodes.
    pub cardinality: Map<N, Option<u64>>,
}

/// Result of a restrictive (multi-source) visit.
#[derive(Clone, Debug)]
pub struct RestrictiveVisitOutcome<N: Node> {
    /// Nodes reached from the sources, sources included.
    pub visited: Set<N>,
    /// Hyperedges that fired: every tail node was reached.
    pub traversed: Set<EdgeId>,
    /// Hyperedges with at least one but not all tail nodes reached.
    pub restrictive: Set<EdgeId>,
}

/// Breadth-first traversal where a hyperedge fires on the first arrival of
/// any tail node.
pub fn visit<N: Node>(
    h: &DirectedHypergraph<N>,
    source: &N,
) -> Result<VisitOutcome<N>, HypergraphError> {
    if !h.has_node(source) {
        return Err(HypergraphError::node_not_found(source));
    }

    let mut node_predecessor: Map<N, Option<EdgeId>> =
        h.nodes().map(|n| (n.clone(), None)).collect();
    let mut edge_predecessor: Map<EdgeId, Option<N>> =
        h.hyperedge_ids().map(|id| (id, None)).collect();
    let mut visited = Set::default();
    visited.insert(source.clone());

    let mut queue = VecDeque::from([source.clone()]);
    while let Some(current) = queue.pop_front() {
        for &id in h.get_forward_star(&current)? {
            if edge_predecessor[&id].is_some() {
                continue;
            }
            edge_predecessor[&id] = Some(current.clone());
            for head_node in h.get_hyperedge(id)?.canonical_head() {
                if visited.contains(head_node) {
                    continue;
                }
                node_predecessor[head_node] = Some(id);
                visited.insert(head_node.clone());
                queue.push_back(head_node.clone());
            }
        }
    }

    Ok(VisitOutcome {
        visited,
        node_predecessor,
        edge_predecessor,
    })
}

/// Whether `target` is reachable from `source` in the [`visit`] sense.
pub fn is_connected<N: Node>(
    h: &DirectedHypergraph<N>,
    source: &N,
    target: &N,
) -> Result<bool, HypergraphError> {
    Ok(visit(h, source)?.visited.contains(target))
}

fn x_visit<N: Node>(
    h: &DirectedHypergraph<N>,
    source: &N,
    orientation: Orientation,
) -> Result<BVisitOutcome<N>, HypergraphError> {
    if !h.has_node(source) {
        return Err(HypergraphError::node_not_found(source));
    }

    let mut node_predecessor: Map<N, Option<EdgeId>> =
        h.nodes().map(|n| (n.clone(), None)).collect();
    let mut edge_predecessor: Map<EdgeId, Option<N>> =
        h.hyperedge_ids().map(|id| (id, None)).collect();
    let mut cardinality: Map<N, Option<u64>> = h.nodes().map(|n| (n.clone(), None)).collect();
    cardinality[source] = Some(0);

    // Arrival counter per hyperedge; a hyperedge fires when its counter
    // reaches the cardinality of its tail.
    let mut arrivals: AHashMap<EdgeId, usize> = AHashMap::new();

    let mut visited = Set::default();
    visited.insert(source.clone());

    let mut queue = VecDeque::from([source.clone()]);
    while let Some(current) = queue.pop_front() {
        for &id in orientation.star(h, &current)? {
            let arrived = arrivals.entry(id).or_insert(0);
            *arrived += 1;
            let edge = h.get_hyperedge(id)?;
            if *arrived < orientation.tail(edge).len() {
                continue;
            }
            edge_predecessor[&id] = Some(current.clone());
            let hops = cardinality[&current].map(|c| c + 1);
            for head_node in orientation.head(edge) {
                if visited.contains(head_node) {
                    continue;
                }
                node_predecessor[head_node] = Some(id);
                cardinality[head_node] = hops;
                visited.insert(head_node.clone());
                queue.push_back(head_node.clone());
            }
        }
    }

    Ok(BVisitOutcome {
        visited,
        node_predecessor,
        edge_predecessor,
        cardinality,
    })
}

/// Breadth-first traversal where a hyperedge fires only once every node of
/// its tail has been reached.
pub fn b_visit<N: Node>(
    h: &DirectedHypergraph<N>,
    source: &N,
) -> Result<BVisitOutcome<N>, HypergraphError> {
    x_visit(h, source, Orientation::Forward)
}

/// [`b_visit`] on the symmetric image, computed without materializing it.
pub fn f_visit<N: Node>(
    h: &DirectedHypergraph<N>,
    source: &N,
) -> Result<BVisitOutcome<N>, HypergraphError> {
    x_visit(h, source, Orientation::Reverse)
}

/// Whether `target` is B-connected to `source`: `target` is the source
/// itself, or some hyperedge into `target` has a fully B-connected tail.
pub fn is_b_connected<N: Node>(
    h: &DirectedHypergraph<N>,
    source: &N,
    target: &N,
) -> Result<bool, HypergraphError> {
    Ok(b_visit(h, source)?.visited.contains(target))
}

/// Whether `target` is F-connected to `source`, i.e. `source` is B-connected
/// to `target`.
pub fn is_f_connected<N: Node>(
    h: &DirectedHypergraph<N>,
    source: &N,
    target: &N,
) -> Result<bool, HypergraphError> {
    Ok(f_visit(h, source)?.visited.contains(target))
}

fn restrictive_x_visit<N: Node>(
    h: &DirectedHypergraph<N>,
    sources: &[N],
    orientation: Orientation,
) -> Result<RestrictiveVisitOutcome<N>, HypergraphError> {
    let mut visited = Set::default();
    let mut queue = VecDeque::new();
    for source in sources {
        if !h.has_node(source) {
            return Err(HypergraphError::node_not_found(source));
        }
        if visited.insert(source.clone()) {
            queue.push_back(source.clone());
        }
    }

    // Insertion-ordered so the restrictive classification below comes out in
    // a reproducible order.
    let mut arrivals: Map<EdgeId, usize> = Map::default();
    let mut traversed = Set::default();

    while let Some(current) = queue.pop_front() {
        for &id in orientation.star(h, &current)? {
            let arrived = arrivals.entry(id).or_insert(0);
            *arrived += 1;
            let edge = h.get_hyperedge(id)?;
            if *arrived < orientation.tail(edge).len() {
                continue;
            }
            traversed.insert(id);
            for head_node in orientation.head(edge) {
                if visited.insert(head_node.clone()) {
                    queue.push_back(head_node.clone());
                }
            }
        }
    }

    let restrictive = arrivals
        .keys()
        .filter(|id| !traversed.contains(*id))
        .copied()
        .collect();

    Ok(RestrictiveVisitOutcome {
        visited,
        traversed,
        restrictive,
    })
}

/// Multi-source B-visit that reports which touched hyperedges fired and
/// which were held back by an incomplete tail.
pub fn restrictive_b_visit<N: Node>(
    h: &DirectedHypergraph<N>,
    sources: &[N],
) -> Result<RestrictiveVisitOutcome<N>, HypergraphError> {
    restrictive_x_visit(h, sources, Orientation::Forward)
}

/// [`restrictive_b_visit`] on the symmetric image.
pub fn restrictive_f_visit<N: Node>(
    h: &DirectedHypergraph<N>,
    sources: &[N],
) -> Result<RestrictiveVisitOutcome<N>, HypergraphError> {
    restrictive_x_visit(h, sources, Orientation::Reverse)
}

/// B-relaxation distance from a source set.
///
/// For each node, the minimum number of hyperedges whose all-tails-reached
/// requirement must be waived before the node becomes reachable: `Some(0)`
/// for nodes already B-connected to the sources, `None` for nodes out of
/// reach under any amount of waiving.
///
/// Level by level, every hyperedge the previous level left restricted is
/// treated as satisfied and a fresh restrictive B-visit is run from its head
/// set; nodes discovered that way sit one relaxation deeper. Each hyperedge
/// is expanded at most once, and visits that share a head set are computed
/// once per call through a cache local to this invocation.
pub fn b_relaxation<N: Node>(
    h: &DirectedHypergraph<N>,
    sources: &[N],
) -> Result<Map<N, Option<u64>>, HypergraphError> {
    let base = restrictive_b_visit(h, sources)?;

    let mut distance: Map<N, Option<u64>> = h.nodes().map(|n| (n.clone(), None)).collect();
    for node in &base.visited {
        distance[node] = Some(0);
    }

    let mut cache: AHashMap<NodeSet<N>, RestrictiveVisitOutcome<N>> = AHashMap::new();
    let mut seen: Set<EdgeId> = Set::default();
    let mut frontier: Vec<EdgeId> = base.restrictive.iter().copied().collect();
    let mut level = 1u64;

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for id in frontier {
            if !seen.insert(id) {
                continue;
            }
            let head = h.get_hyperedge(id)?.canonical_head().clone();
            let outcome = match cache.entry(head) {
                std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
                std::collections::hash_map::Entry::Vacant(entry) => {
                    let seeds: Vec<N> = entry.key().iter().cloned().collect();
                    entry.insert(restrictive_b_visit(h, &seeds)?)
                }
            };
            for node in &outcome.visited {
                if distance[node].is_none() {
                    distance[node] = Some(level);
                }
            }
            next.extend(outcome.restrictive.iter().filter(|e| !seen.contains(*e)));
        }
        frontier = next;
        level += 1;
    }

    Ok(distance)
}
