//! Algorithms over directed hypergraphs.
//!
//! The traversal and shortest-tree algorithms come in B and F flavors: the B
//! flavor walks hyperedges forward and requires every tail node to arrive
//! before a hyperedge fires, the F flavor is the same procedure on the
//! symmetric image. Rather than materializing the image, the F flavor swaps
//! the star and tail/head accessors, which is what [`Orientation`] captures.

use crate::hypergraph::nodeset::{Node, NodeSet};
use crate::hypergraph::{DirectedHypergraph, EdgeId, Hyperedge, HypergraphError, Set};

pub mod k_shortest;
pub mod shortest;
pub mod traversal;

/// Which way a B-style procedure reads the hypergraph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Orientation {
    /// Read the hypergraph as stored.
    Forward,
    /// Read the symmetric image: stars swapped, tails and heads swapped.
    Reverse,
}

impl Orientation {
    pub(crate) fn star<'a, N: Node>(
        self,
        h: &'a DirectedHypergraph<N>,
        node: &N,
    ) -> Result<&'a Set<EdgeId>, HypergraphError> {
        match self {
            Orientation::Forward => h.get_forward_star(node),
            Orientation::Reverse => h.get_backward_star(node),
        }
    }

    pub(crate) fn tail<'a, N: Node>(self, edge: &'a Hyperedge<N>) -> &'a NodeSet<N> {
        match self {
            Orientation::Forward => edge.canonical_tail(),
            Orientation::Reverse => edge.canonical_head(),
        }
    }

    pub(crate) fn head<'a, N: Node>(self, edge: &'a Hyperedge<N>) -> &'a NodeSet<N> {
        match self {
            Orientation::Forward => edge.canonical_head(),
            Orientation::Reverse => edge.canonical_tail(),
        }
    }
}
