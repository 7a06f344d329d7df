//! Directed hypergraph store.
//!
//! A directed hypergraph contains nodes and hyperedges; each hyperedge
//! connects a *tail set* of nodes to a *head set* of nodes (tail and head
//! cannot both be empty). Self-loops are allowed, but parallel hyperedges
//! with the same tail and head collapse onto one hyperedge.
//!
//! The store keeps several derived indices — forward/backward stars per node
//! and two-level successor/predecessor maps keyed by canonical tail and head
//! sets — which must stay mutually consistent on every mutation. All
//! mutation goes through the public methods; [`DirectedHypergraph::check_consistency`]
//! re-derives and cross-checks every index as a diagnostic.

use std::fmt;
use std::mem;

use ahash::{AHashSet, RandomState};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod attributes;
pub mod nodeset;

use attributes::{AttrValue, Attrs};
use nodeset::{Node, NodeSet};

/// Insertion-ordered map used throughout the store.
///
/// Iteration order is the insertion order, which keeps traversals and
/// shortest-path tie-breaking reproducible from run to run.
pub type Map<K, V> = IndexMap<K, V, RandomState>;

/// Insertion-ordered set, same rationale as [`Map`].
pub type Set<T> = IndexSet<T, RandomState>;

/// Identifier of a hyperedge, assigned by the store.
///
/// IDs are issued from a per-store counter starting at 1 and are never
/// reused, even after the hyperedge is removed. [`fmt::Display`] renders the
/// conventional `e{n}` form.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeId(u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HypergraphError {
    #[error("tail and head cannot both be empty")]
    EmptyHyperedge,
    #[error("no such node: {0}")]
    NodeNotFound(String),
    #[error("no such hyperedge: {0}")]
    HyperedgeNotFound(EdgeId),
    #[error("no hyperedge connects the given tail and head")]
    ConnectionNotFound,
    #[error("no such attribute: {0}")]
    AttributeNotFound(String),
}

impl HypergraphError {
    pub(crate) fn node_not_found<N: Node>(node: &N) -> Self {
        HypergraphError::NodeNotFound(format!("{node:?}"))
    }
}

/// First index inconsistency found by [`DirectedHypergraph::check_consistency`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("hyperedge {edge}: canonical tail/head does not match its stored tail/head")]
    CanonicalMismatch { edge: EdgeId },
    #[error("hyperedge {edge} is missing from the successor/predecessor maps")]
    MissingFromAdjacency { edge: EdgeId },
    #[error("successor and predecessor maps disagree on hyperedge {edge}")]
    AdjacencyAsymmetry { edge: EdgeId },
    #[error("hyperedge {edge} is missing from the {star} star of node {node}")]
    MissingFromStar {
        edge: EdgeId,
        star: &'static str,
        node: String,
    },
    #[error("{star} star of node {node} lists hyperedge {edge}, which does not contain the node")]
    StrayStarEntry {
        edge: EdgeId,
        star: &'static str,
        node: String,
    },
    #[error("node {node} has no {star} star entry")]
    MissingStar { node: String, star: &'static str },
    #[error("index references hyperedge {edge}, which has no record")]
    UnknownHyperedge { edge: EdgeId },
    #[error("hyperedge {edge} references node {node}, which has no record")]
    UnknownNode { edge: EdgeId, node: String },
}

/// A directed hyperedge: a weighted connection from a tail set to a head set.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hyperedge<N: Node> {
    tail: Vec<N>,
    head: Vec<N>,
    ctail: NodeSet<N>,
    chead: NodeSet<N>,
    weight: f64,
    attrs: Attrs,
}

impl<N: Node> Hyperedge<N> {
    /// The tail nodes exactly as supplied by the caller.
    pub fn tail(&self) -> &[N] {
        &self.tail
    }

    /// The head nodes exactly as supplied by the caller.
    pub fn head(&self) -> &[N] {
        &self.head
    }

    /// Canonical (sorted, deduplicated) tail set.
    pub fn canonical_tail(&self) -> &NodeSet<N> {
        &self.ctail
    }

    /// Canonical (sorted, deduplicated) head set.
    pub fn canonical_head(&self) -> &NodeSet<N> {
        &self.chead
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }
}

/// The hypergraph store itself. See the module docs for the data model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DirectedHypergraph<N: Node> {
    node_attrs: Map<N, Attrs>,
    edges: Map<EdgeId, Hyperedge<N>>,
    forward_star: Map<N, Set<EdgeId>>,
    backward_star: Map<N, Set<EdgeId>>,
    successors: Map<NodeSet<N>, Map<NodeSet<N>, EdgeId>>,
    predecessors: Map<NodeSet<N>, Map<NodeSet<N>, EdgeId>>,
    next_edge_id: u64,
}

impl<N: Node> Default for DirectedHypergraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node> DirectedHypergraph<N> {
    pub fn new() -> Self {
        DirectedHypergraph {
            node_attrs: Map::default(),
            edges: Map::default(),
            forward_star: Map::default(),
            backward_star: Map::default(),
            successors: Map::default(),
            predecessors: Map::default(),
            next_edge_id: 0,
        }
    }

    // ---- nodes ----

    pub fn has_node(&self, node: &N) -> bool {
        self.node_attrs.contains_key(node)
    }

    pub fn node_count(&self) -> usize {
        self.node_attrs.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.node_attrs.keys()
    }

    /// Adds a node with no attributes. Re-adding an existing node is a no-op.
    pub fn add_node(&mut self, node: N) {
        self.add_node_with_attrs(node, Attrs::default());
    }

    /// Adds a node, merging `attrs` into any attributes it already carries
    /// (new values overwrite old ones). Never fails.
    pub fn add_node_with_attrs(&mut self, node: N, attrs: Attrs) {
        if let Some(existing) = self.node_attrs.get_mut(&node) {
            existing.extend(attrs);
        } else {
            self.forward_star.insert(node.clone(), Set::default());
            self.backward_star.insert(node.clone(), Set::default());
            self.node_attrs.insert(node, attrs);
        }
    }

    /// Adds every node of `nodes`, attribute-free.
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = N>) {
        for node in nodes {
            self.add_node(node);
        }
    }

    /// Removes a node together with every hyperedge that contains it in its
    /// tail or head.
    pub fn remove_node(&mut self, node: &N) -> Result<(), HypergraphError> {
        if !self.has_node(node) {
            return Err(HypergraphError::node_not_found(node));
        }
        let mut touching: Set<EdgeId> = self.forward_star[node].clone();
        touching.extend(self.backward_star[node].iter().copied());
        for id in touching {
            self.remove_hyperedge(id)?;
        }
        self.forward_star.shift_remove(node);
        self.backward_star.shift_remove(node);
        self.node_attrs.shift_remove(node);
        Ok(())
    }

    /// Removes every node of `nodes`, cascading like [`remove_node`].
    ///
    /// [`remove_node`]: DirectedHypergraph::remove_node
    pub fn remove_nodes(
        &mut self,
        nodes: impl IntoIterator<Item = N>,
    ) -> Result<(), HypergraphError> {
        for node in nodes {
            self.remove_node(&node)?;
        }
        Ok(())
    }

    pub fn get_node_attributes(&self, node: &N) -> Result<&Attrs, HypergraphError> {
        self.node_attrs
            .get(node)
            .ok_or_else(|| HypergraphError::node_not_found(node))
    }

    pub fn get_node_attribute(
        &self,
        node: &N,
        name: &str,
    ) -> Result<&attributes::AttrValue, HypergraphError> {
        self.get_node_attributes(node)?
            .get(name)
            .ok_or_else(|| HypergraphError::AttributeNotFound(name.to_owned()))
    }

    // ---- hyperedges ----

    fn next_id(&mut self) -> EdgeId {
        self.next_edge_id += 1;
        EdgeId(self.next_edge_id)
    }

    /// Adds a hyperedge with the default weight of 1.
    ///
    /// Any tail or head node not yet in the hypergraph is added
    /// automatically. If a hyperedge with the same canonical tail and head
    /// already exists, its ID is returned and no new hyperedge is created.
    pub fn add_hyperedge(
        &mut self,
        tail: impl IntoIterator<Item = N>,
        head: impl IntoIterator<Item = N>,
    ) -> Result<EdgeId, HypergraphError> {
        self.add_hyperedge_with(tail, head, None, Attrs::default())
    }

    /// Adds a hyperedge with an explicit weight. Same identity semantics as
    /// [`add_hyperedge`]: re-adding an existing (tail, head) pair updates its
    /// weight in place.
    ///
    /// [`add_hyperedge`]: DirectedHypergraph::add_hyperedge
    pub fn add_weighted_hyperedge(
        &mut self,
        tail: impl IntoIterator<Item = N>,
        head: impl IntoIterator<Item = N>,
        weight: f64,
    ) -> Result<EdgeId, HypergraphError> {
        self.add_hyperedge_with(tail, head, Some(weight), Attrs::default())
    }

    /// Adds a batch of weighted hyperedges, returning their IDs in order.
    pub fn add_hyperedges<T, H>(
        &mut self,
        hyperedges: impl IntoIterator<Item = (T, H, f64)>,
    ) -> Result<Vec<EdgeId>, HypergraphError>
    where
        T: IntoIterator<Item = N>,
        H: IntoIterator<Item = N>,
    {
        hyperedges
            .into_iter()
            .map(|(tail, head, weight)| self.add_weighted_hyperedge(tail, head, weight))
            .collect()
    }

    /// Full form of hyperedge insertion.
    ///
    /// For a new (tail, head) pair, a fresh ID is issued, the weight defaults
    /// to 1 when not given, and all indices are updated. For an existing
    /// pair, `attrs` are merged into the hyperedge's bag, the weight is
    /// overwritten when given, and the existing ID is returned.
    ///
    /// The weight is mirrored into the bag under the `"weight"` key, so it is
    /// always visible through the attribute getters. A numeric `"weight"`
    /// entry in `attrs` sets the typed field the same way; an explicit
    /// `weight` argument wins over it.
    pub fn add_hyperedge_with(
        &mut self,
        tail: impl IntoIterator<Item = N>,
        head: impl IntoIterator<Item = N>,
        weight: Option<f64>,
        mut attrs: Attrs,
    ) -> Result<EdgeId, HypergraphError> {
        let tail: Vec<N> = tail.into_iter().collect();
        let head: Vec<N> = head.into_iter().collect();
        if tail.is_empty() && head.is_empty() {
            return Err(HypergraphError::EmptyHyperedge);
        }
        let ctail: NodeSet<N> = tail.iter().cloned().collect();
        let chead: NodeSet<N> = head.iter().cloned().collect();

        if let Some(&id) = self.successors.get(&ctail).and_then(|m| m.get(&chead)) {
            let edge = &mut self.edges[&id];
            edge.attrs.extend(attrs);
            if let Some(w) = weight {
                edge.weight = w;
            } else if let Some(w) = edge.attrs.get("weight").and_then(AttrValue::as_float) {
                edge.weight = w;
            }
            edge.attrs
                .insert("weight".to_owned(), AttrValue::Float(edge.weight));
            return Ok(id);
        }

        for node in ctail.iter().chain(chead.iter()) {
            self.add_node(node.clone());
        }

        let id = self.next_id();
        for node in ctail.iter() {
            self.forward_star[node].insert(id);
        }
        for node in chead.iter() {
            self.backward_star[node].insert(id);
        }
        self.successors
            .entry(ctail.clone())
            .or_default()
            .insert(chead.clone(), id);
        self.predecessors
            .entry(chead.clone())
            .or_default()
            .insert(ctail.clone(), id);
        let weight = weight
            .or_else(|| attrs.get("weight").and_then(AttrValue::as_float))
            .unwrap_or(1.0);
        attrs.insert("weight".to_owned(), AttrValue::Float(weight));
        self.edges.insert(
            id,
            Hyperedge {
                tail,
                head,
                ctail,
                chead,
                weight,
                attrs,
            },
        );
        Ok(id)
    }

    /// Removes a hyperedge from the store and every index. Its ID is retired
    /// for good.
    pub fn remove_hyperedge(&mut self, id: EdgeId) -> Result<(), HypergraphError> {
        let edge = self
            .edges
            .shift_remove(&id)
            .ok_or(HypergraphError::HyperedgeNotFound(id))?;
        for node in edge.ctail.iter() {
            self.forward_star[node].shift_remove(&id);
        }
        for node in edge.chead.iter() {
            self.backward_star[node].shift_remove(&id);
        }
        let tail_map = &mut self.successors[&edge.ctail];
        tail_map.shift_remove(&edge.chead);
        if tail_map.is_empty() {
            self.successors.shift_remove(&edge.ctail);
        }
        let head_map = &mut self.predecessors[&edge.chead];
        head_map.shift_remove(&edge.ctail);
        if head_map.is_empty() {
            self.predecessors.shift_remove(&edge.chead);
        }
        Ok(())
    }

    /// Removes every hyperedge of `ids`.
    pub fn remove_hyperedges(
        &mut self,
        ids: impl IntoIterator<Item = EdgeId>,
    ) -> Result<(), HypergraphError> {
        for id in ids {
            self.remove_hyperedge(id)?;
        }
        Ok(())
    }

    pub fn has_hyperedge_id(&self, id: EdgeId) -> bool {
        self.edges.contains_key(&id)
    }

    /// Whether some hyperedge connects the given tail set to the given head
    /// set.
    pub fn has_hyperedge(
        &self,
        tail: impl IntoIterator<Item = N>,
        head: impl IntoIterator<Item = N>,
    ) -> bool {
        let ctail: NodeSet<N> = tail.into_iter().collect();
        let chead: NodeSet<N> = head.into_iter().collect();
        self.successors
            .get(&ctail)
            .is_some_and(|m| m.contains_key(&chead))
    }

    /// The ID of the hyperedge connecting the given tail set to the given
    /// head set.
    pub fn get_hyperedge_id(
        &self,
        tail: impl IntoIterator<Item = N>,
        head: impl IntoIterator<Item = N>,
    ) -> Result<EdgeId, HypergraphError> {
        let ctail: NodeSet<N> = tail.into_iter().collect();
        let chead: NodeSet<N> = head.into_iter().collect();
        self.successors
            .get(&ctail)
            .and_then(|m| m.get(&chead))
            .copied()
            .ok_or(HypergraphError::ConnectionNotFound)
    }

    pub fn hyperedge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn hyperedge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.keys().copied()
    }

    pub fn get_hyperedge(&self, id: EdgeId) -> Result<&Hyperedge<N>, HypergraphError> {
        self.edges
            .get(&id)
            .ok_or(HypergraphError::HyperedgeNotFound(id))
    }

    pub fn get_hyperedge_tail(&self, id: EdgeId) -> Result<&[N], HypergraphError> {
        Ok(self.get_hyperedge(id)?.tail())
    }

    pub fn get_hyperedge_head(&self, id: EdgeId) -> Result<&[N], HypergraphError> {
        Ok(self.get_hyperedge(id)?.head())
    }

    pub fn get_hyperedge_weight(&self, id: EdgeId) -> Result<f64, HypergraphError> {
        Ok(self.get_hyperedge(id)?.weight())
    }

    pub fn get_hyperedge_attributes(&self, id: EdgeId) -> Result<&Attrs, HypergraphError> {
        Ok(self.get_hyperedge(id)?.attrs())
    }

    pub fn get_hyperedge_attribute(
        &self,
        id: EdgeId,
        name: &str,
    ) -> Result<&attributes::AttrValue, HypergraphError> {
        self.get_hyperedge_attributes(id)?
            .get(name)
            .ok_or_else(|| HypergraphError::AttributeNotFound(name.to_owned()))
    }

    // ---- adjacency queries ----

    /// Hyperedges whose tail contains `node`.
    pub fn get_forward_star(&self, node: &N) -> Result<&Set<EdgeId>, HypergraphError> {
        self.forward_star
            .get(node)
            .ok_or_else(|| HypergraphError::node_not_found(node))
    }

    /// Hyperedges whose head contains `node`.
    pub fn get_backward_star(&self, node: &N) -> Result<&Set<EdgeId>, HypergraphError> {
        self.backward_star
            .get(node)
            .ok_or_else(|| HypergraphError::node_not_found(node))
    }

    /// Hyperedges whose tail is exactly the given node set. A tail set that
    /// is not the tail of any hyperedge yields an empty set; this is not an
    /// error.
    pub fn get_successors(&self, tail: impl IntoIterator<Item = N>) -> Set<EdgeId> {
        let ctail: NodeSet<N> = tail.into_iter().collect();
        self.successors
            .get(&ctail)
            .map(|m| m.values().copied().collect())
            .unwrap_or_default()
    }

    /// Hyperedges whose head is exactly the given node set. Mirror of
    /// [`get_successors`].
    ///
    /// [`get_successors`]: DirectedHypergraph::get_successors
    pub fn get_predecessors(&self, head: impl IntoIterator<Item = N>) -> Set<EdgeId> {
        let chead: NodeSet<N> = head.into_iter().collect();
        self.predecessors
            .get(&chead)
            .map(|m| m.values().copied().collect())
            .unwrap_or_default()
    }

    // ---- whole-graph operations ----

    /// A new hypergraph with every hyperedge's tail and head swapped. The
    /// derived indices of the image are swapped along, so the image is
    /// internally consistent.
    pub fn get_symmetric_image(&self) -> Self {
        let mut image = self.clone();
        for edge in image.edges.values_mut() {
            mem::swap(&mut edge.tail, &mut edge.head);
            mem::swap(&mut edge.ctail, &mut edge.chead);
        }
        mem::swap(&mut image.forward_star, &mut image.backward_star);
        mem::swap(&mut image.successors, &mut image.predecessors);
        image
    }

    /// True iff every hyperedge has exactly one head node.
    pub fn is_b_hypergraph(&self) -> bool {
        self.edges.values().all(|e| e.chead.len() == 1)
    }

    /// True iff every hyperedge has exactly one tail node.
    pub fn is_f_hypergraph(&self) -> bool {
        self.edges.values().all(|e| e.ctail.len() == 1)
    }

    /// True iff every hyperedge is a B-hyperedge or an F-hyperedge.
    pub fn is_bf_hypergraph(&self) -> bool {
        self.edges
            .values()
            .all(|e| e.ctail.len() == 1 || e.chead.len() == 1)
    }

    /// The subhypergraph induced by `nodes`: those nodes, and exactly the
    /// hyperedges whose tail and head sets are subsets of them.
    pub fn get_induced_subhypergraph(
        &self,
        nodes: impl IntoIterator<Item = N>,
    ) -> Result<Self, HypergraphError> {
        let keep: AHashSet<N> = nodes.into_iter().collect();
        let mut sub = self.clone();
        let drop = sub
            .node_attrs
            .keys()
            .filter(|n| !keep.contains(*n))
            .cloned()
            .collect_vec();
        for node in &drop {
            sub.remove_node(node)?;
        }
        Ok(sub)
    }

    // ---- diagnostics ----

    /// Cross-checks every derived index against the hyperedge records.
    ///
    /// This is a verification facility for tests and debugging; normal
    /// operation never needs it.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        for (&id, edge) in &self.edges {
            let ctail: NodeSet<N> = edge.tail.iter().cloned().collect();
            let chead: NodeSet<N> = edge.head.iter().cloned().collect();
            if ctail != edge.ctail || chead != edge.chead {
                return Err(ConsistencyError::CanonicalMismatch { edge: id });
            }
            match self.successors.get(&edge.ctail).and_then(|m| m.get(&edge.chead)) {
                Some(&found) if found == id => {}
                _ => return Err(ConsistencyError::MissingFromAdjacency { edge: id }),
            }
            match self.predecessors.get(&edge.chead).and_then(|m| m.get(&edge.ctail)) {
                Some(&found) if found == id => {}
                _ => return Err(ConsistencyError::AdjacencyAsymmetry { edge: id }),
            }
            for node in edge.ctail.iter() {
                if !self.node_attrs.contains_key(node) {
                    return Err(ConsistencyError::UnknownNode {
                        edge: id,
                        node: format!("{node:?}"),
                    });
                }
                if !self.forward_star.get(node).is_some_and(|s| s.contains(&id)) {
                    return Err(ConsistencyError::MissingFromStar {
                        edge: id,
                        star: "forward",
                        node: format!("{node:?}"),
                    });
                }
            }
            for node in edge.chead.iter() {
                if !self.node_attrs.contains_key(node) {
                    return Err(ConsistencyError::UnknownNode {
                        edge: id,
                        node: format!("{node:?}"),
                    });
                }
                if !self.backward_star.get(node).is_some_and(|s| s.contains(&id)) {
                    return Err(ConsistencyError::MissingFromStar {
                        edge: id,
                        star: "backward",
                        node: format!("{node:?}"),
                    });
                }
            }
        }

        for node in self.node_attrs.keys() {
            if !self.forward_star.contains_key(node) {
                return Err(ConsistencyError::MissingStar {
                    node: format!("{node:?}"),
                    star: "forward",
                });
            }
            if !self.backward_star.contains_key(node) {
                return Err(ConsistencyError::MissingStar {
                    node: format!("{node:?}"),
                    star: "backward",
                });
            }
        }

        for (star_name, stars, side) in [
            ("forward", &self.forward_star, "tail"),
            ("backward", &self.backward_star, "head"),
        ] {
            for (node, ids) in stars {
                for &id in ids {
                    let Some(edge) = self.edges.get(&id) else {
                        return Err(ConsistencyError::UnknownHyperedge { edge: id });
                    };
                    let members = if side == "tail" { &edge.ctail } else { &edge.chead };
                    if !members.contains(node) {
                        return Err(ConsistencyError::StrayStarEntry {
                            edge: id,
                            star: star_name,
                            node: format!("{node:?}"),
                        });
                    }
                }
            }
        }

        for (maps, mirror) in [
            (&self.successors, &self.predecessors),
            (&self.predecessors, &self.successors),
        ] {
            for (first, inner) in maps {
                for (second, &id) in inner {
                    if !self.edges.contains_key(&id) {
                        return Err(ConsistencyError::UnknownHyperedge { edge: id });
                    }
                    match mirror.get(second).and_then(|m| m.get(first)) {
                        Some(&found) if found == id => {}
                        _ => return Err(ConsistencyError::AdjacencyAsymmetry { edge: id }),
                    }
                }
            }
        }

        Ok(())
    }
}
