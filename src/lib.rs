//! Directed hypergraphs and the paths through them.
//!
//! A directed hypergraph generalizes a directed graph: each hyperedge runs
//! from a *set* of tail nodes to a *set* of head nodes, so "reachable"
//! splits into several notions depending on whether one arriving tail node
//! suffices or all of them must arrive. This crate provides:
//!
//! - [`hypergraph`]: the store itself, with per-node forward/backward stars
//!   and set-keyed successor/predecessor indices kept consistent under
//!   insertion and removal.
//! - [`algorithms::traversal`]: Visit, B-Visit and F-Visit traversals,
//!   connectivity predicates, and B-relaxation distances.
//! - [`algorithms::shortest`]: shortest B-trees and F-trees (Dijkstra
//!   generalized to all-tail-arrival hyperedges) with pluggable tail
//!   aggregation, plus hypertree and hyperpath reconstruction.
//! - [`algorithms::k_shortest`]: the k shortest hyperpaths of a
//!   B-hypergraph by branch and bound.
//! - [`queue`]: the decrease-key priority queue backing the shortest-tree
//!   search.
//!
//! ```
//! use hyperstar::algorithms::shortest::{shortest_b_tree, SumAggregator};
//! use hyperstar::DirectedHypergraph;
//!
//! let mut h = DirectedHypergraph::new();
//! h.add_weighted_hyperedge(["s"], ["a"], 1.0)?;
//! h.add_weighted_hyperedge(["s"], ["b"], 2.0)?;
//! h.add_weighted_hyperedge(["a", "b"], ["t"], 1.0)?;
//!
//! let tree = shortest_b_tree(&h, &"s", &SumAggregator)?;
//! assert_eq!(tree.weight[&"t"], 4.0);
//! # Ok::<(), hyperstar::HypergraphError>(())
//! ```

pub mod algorithms;
pub mod hypergraph;
pub mod queue;

pub use hypergraph::attributes::{attrs, AttrValue, Attrs};
pub use hypergraph::nodeset::{Node, NodeSet};
pub use hypergraph::{DirectedHypergraph, EdgeId, Hyperedge, HypergraphError};
pub use queue::PriorityQueue;
