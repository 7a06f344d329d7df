//! Shortest B-trees and F-trees: Dijkstra generalized to hyperedges whose
//! whole tail must settle before the hyperedge can relax its heads.
//!
//! A node's weight through a hyperedge is `edge.weight + F(tail, W)`, where
//! `F` is a pluggable [`TailAggregator`]: [`SumAggregator`] for additive path
//! weight, [`DistanceAggregator`] (max over the tail, also called rank) and
//! [`GapAggregator`] (min over the tail) for bottleneck-style measures. A
//! hyperedge is considered only after every tail node has been popped, at
//! which point those weights are final, which is exactly the Dijkstra
//! argument carried over to multi-node tails.
//!
//! The companion reconstruction functions rebuild the hypertree or a single
//! source-to-destination hyperpath out of a predecessor map.

use std::collections::VecDeque;

use ahash::AHashMap;
use thiserror::Error;

use crate::hypergraph::attributes::{AttrValue, Attrs};
use crate::hypergraph::nodeset::{Node, NodeSet};
use crate::hypergraph::{DirectedHypergraph, EdgeId, HypergraphError, Map, Set};
use crate::queue::PriorityQueue;

use super::Orientation;

/// Error raised when reconstructing a hypertree or hyperpath from a
/// predecessor map that does not describe one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("predecessor map references unknown node {0}")]
    UnknownNode(String),
    #[error("predecessor map references unknown hyperedge {0}")]
    UnknownHyperedge(EdgeId),
    #[error("predecessor map has no root node")]
    NoRoot,
    #[error("predecessor map has more than one root node")]
    MultipleRoots,
    #[error("the root of the predecessor map is not the given source")]
    SourceNotRoot,
    #[error("destination does not appear in the predecessor map")]
    UnreachableDestination,
    #[error("predecessor map is missing an entry for node {0}")]
    MissingEntry(String),
    #[error(transparent)]
    Hypergraph(#[from] HypergraphError),
}

/// Combines the settled weights of a hyperedge's tail nodes into the scalar
/// that the hyperedge's own weight is added to.
pub trait TailAggregator<N: Node> {
    fn aggregate(&self, tail: &NodeSet<N>, weights: &Map<N, f64>) -> f64;
}

fn node_weight<N: Node>(weights: &Map<N, f64>, node: &N) -> f64 {
    weights.get(node).copied().unwrap_or(f64::INFINITY)
}

/// Sum of the tail weights: additive path weight, the usual notion of
/// shortest.
#[derive(Clone, Copy, Debug, Default)]
pub struct SumAggregator;

impl<N: Node> TailAggregator<N> for SumAggregator {
    fn aggregate(&self, tail: &NodeSet<N>, weights: &Map<N, f64>) -> f64 {
        tail.iter().map(|n| node_weight(weights, n)).sum()
    }
}

/// Maximum of the tail weights, also known as the rank function.
#[derive(Clone, Copy, Debug, Default)]
pub struct DistanceAggregator;

impl<N: Node> TailAggregator<N> for DistanceAggregator {
    fn aggregate(&self, tail: &NodeSet<N>, weights: &Map<N, f64>) -> f64 {
        tail.iter()
            .map(|n| node_weight(weights, n))
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Minimum of the tail weights.
#[derive(Clone, Copy, Debug, Default)]
pub struct GapAggregator;

impl<N: Node> TailAggregator<N> for GapAggregator {
    fn aggregate(&self, tail: &NodeSet<N>, weights: &Map<N, f64>) -> f64 {
        tail.iter()
            .map(|n| node_weight(weights, n))
            .fold(f64::INFINITY, f64::min)
    }
}

/// A shortest B-hypertree (or F-hypertree) rooted at a source node.
#[derive(Clone, Debug)]
pub struct ShortestTree<N: Node> {
    /// For each node, the hyperedge it is best reached through. `None` for
    /// the source and for unreachable nodes.
    pub predecessor: Map<N, Option<EdgeId>>,
    /// Final weight of each node; `f64::INFINITY` where unreachable.
    pub weight: Map<N, f64>,
    /// Nodes in the order their weights became final. A valid ordering: every
    /// node appears after all tail nodes of its predecessor hyperedge.
    pub ordering: Vec<N>,
}

fn shortest_x_tree<N: Node>(
    h: &DirectedHypergraph<N>,
    source: &N,
    orientation: Orientation,
    aggregator: &impl TailAggregator<N>,
) -> Result<ShortestTree<N>, HypergraphError> {
    if !h.has_node(source) {
        return Err(HypergraphError::node_not_found(source));
    }

    let mut predecessor: Map<N, Option<EdgeId>> = h.nodes().map(|n| (n.clone(), None)).collect();
    let mut weight: Map<N, f64> = h.nodes().map(|n| (n.clone(), f64::INFINITY)).collect();
    weight[source] = 0.0;

    let mut arrivals: AHashMap<EdgeId, usize> = AHashMap::new();
    let mut ordering = Vec::new();

    let mut queue = PriorityQueue::new();
    queue.push(0.0, source.clone());

    while let Some((_, current)) = queue.pop() {
        ordering.push(current.clone());
        for &id in orientation.star(h, &current)? {
            let arrived = arrivals.entry(id).or_insert(0);
            *arrived += 1;
            let edge = h.get_hyperedge(id)?;
            let tail = orientation.tail(edge);
            if *arrived < tail.len() {
                continue;
            }
            // Every tail weight is final now.
            let candidate = edge.weight() + aggregator.aggregate(tail, &weight);
            for head_node in orientation.head(edge) {
                // First strictly better update wins; equal weights never
                // displace an earlier predecessor.
                if candidate < weight[head_node] {
                    weight[head_node] = candidate;
                    predecessor[head_node] = Some(id);
                    if queue.contains(head_node) {
                        queue.reprioritize(candidate, head_node.clone());
                    } else {
                        queue.push(candidate, head_node.clone());
                    }
                }
            }
        }
    }

    Ok(ShortestTree {
        predecessor,
        weight,
        ordering,
    })
}

/// Shortest B-hypertree rooted at `source`.
pub fn shortest_b_tree<N: Node>(
    h: &DirectedHypergraph<N>,
    source: &N,
    aggregator: &impl TailAggregator<N>,
) -> Result<ShortestTree<N>, HypergraphError> {
    shortest_x_tree(h, source, Orientation::Forward, aggregator)
}

/// Shortest F-hypertree rooted at `source`: [`shortest_b_tree`] on the
/// symmetric image, computed without materializing it.
pub fn shortest_f_tree<N: Node>(
    h: &DirectedHypergraph<N>,
    source: &N,
    aggregator: &impl TailAggregator<N>,
) -> Result<ShortestTree<N>, HypergraphError> {
    shortest_x_tree(h, source, Orientation::Reverse, aggregator)
}

/// Rebuilds the hypertree a predecessor map describes: the source, every
/// node with a predecessor, and the predecessor hyperedges themselves
/// (carried over by tail, head and attributes; the rebuilt hypergraph issues
/// its own IDs). With `node_weights`, each node gets its weight recorded
/// under the `"weight"` attribute.
pub fn get_hypertree_from_predecessors<N: Node>(
    h: &DirectedHypergraph<N>,
    predecessor: &Map<N, Option<EdgeId>>,
    source: &N,
    node_weights: Option<&Map<N, f64>>,
) -> Result<DirectedHypergraph<N>, PathError> {
    let mut tree = DirectedHypergraph::new();

    let mut members: Vec<&N> = predecessor
        .iter()
        .filter(|(_, pred)| pred.is_some())
        .map(|(node, _)| node)
        .collect();
    members.push(source);
    for node in members {
        let attrs = match node_weights {
            Some(weights) => {
                let mut attrs = Attrs::default();
                attrs.insert("weight".to_owned(), AttrValue::Float(node_weight(weights, node)));
                attrs
            }
            None => Attrs::default(),
        };
        tree.add_node_with_attrs(node.clone(), attrs);
    }

    for id in predecessor.values().copied().flatten() {
        let edge = h.get_hyperedge(id)?;
        tree.add_hyperedge_with(
            edge.tail().to_vec(),
            edge.head().to_vec(),
            Some(edge.weight()),
            edge.attrs().clone(),
        )?;
    }

    Ok(tree)
}

/// Back-traces the hyperpath from `destination` to `source` along a
/// predecessor map and rebuilds it as its own hypergraph (a lone source node
/// when source and destination coincide).
///
/// The map must describe a tree rooted at `source`: every key a node of `h`,
/// every value a live hyperedge of `h`, and exactly one root (a `None`
/// entry) which must be the source itself.
pub fn get_hyperpath_from_predecessors<N: Node>(
    h: &DirectedHypergraph<N>,
    predecessor: &Map<N, Option<EdgeId>>,
    source: &N,
    destination: &N,
) -> Result<DirectedHypergraph<N>, PathError> {
    let mut roots = 0usize;
    for (node, pred) in predecessor {
        if !h.has_node(node) {
            return Err(PathError::UnknownNode(format!("{node:?}")));
        }
        match pred {
            None => roots += 1,
            Some(id) if !h.has_hyperedge_id(*id) => {
                return Err(PathError::UnknownHyperedge(*id));
            }
            Some(_) => {}
        }
    }
    match roots {
        0 => return Err(PathError::NoRoot),
        1 => {}
        _ => return Err(PathError::MultipleRoots),
    }
    if predecessor.get(source) != Some(&None) {
        return Err(PathError::SourceNotRoot);
    }
    if !predecessor.contains_key(destination) {
        return Err(PathError::UnreachableDestination);
    }

    let mut path = DirectedHypergraph::new();

    let mut enqueued: Set<N> = Set::default();
    enqueued.insert(destination.clone());
    let mut pending = VecDeque::from([destination.clone()]);
    while let Some(node) = pending.pop_front() {
        let Some(pred) = predecessor.get(&node) else {
            return Err(PathError::MissingEntry(format!("{node:?}")));
        };
        match pred {
            Some(id) => {
                let edge = h.get_hyperedge(*id)?;
                for tail_node in edge.canonical_tail() {
                    if enqueued.insert(tail_node.clone()) {
                        pending.push_back(tail_node.clone());
                    }
                }
                path.add_hyperedge_with(
                    edge.tail().to_vec(),
                    edge.head().to_vec(),
                    Some(edge.weight()),
                    edge.attrs().clone(),
                )?;
            }
            None => path.add_node(node),
        }
    }

    Ok(path)
}
