//! K shortest hyperpaths in a B-hypergraph, after Nielsen, Andersen and
//! Pretolani, "Finding the K shortest hyperpaths" (Computers & Operations
//! Research 32, 2005).
//!
//! Branch and bound over candidate subgraphs. Each candidate is a private
//! copy of the hypergraph paired with either an exact shortest tree or only
//! a lower bound on its best source-to-destination weight. The cheapest
//! candidate is always worked next: an exact candidate emits its hyperpath
//! and is split by the branching step into subgraphs that each diverge from
//! the emitted path at one position of its ordering; a bound-only candidate
//! is resolved exactly and reconsidered. Lower bounds never exceed the true
//! optimum of their branch, and the branches partition the remaining
//! hyperpaths without overlap, so paths come out in non-decreasing weight
//! order with none skipped or repeated.

use itertools::Itertools;
use thiserror::Error;

use crate::hypergraph::nodeset::Node;
use crate::hypergraph::{DirectedHypergraph, EdgeId, HypergraphError, Map};

use super::shortest::{
    get_hyperpath_from_predecessors, shortest_b_tree, PathError, ShortestTree, TailAggregator,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KShortestError {
    #[error("hypergraph must be a B-hypergraph")]
    NotBHypergraph,
    #[error("source node is not in the hypergraph: {0}")]
    SourceNotFound(String),
    #[error("destination node is not in the hypergraph: {0}")]
    DestinationNotFound(String),
    #[error("k must be a positive integer")]
    InvalidK,
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Hypergraph(#[from] HypergraphError),
}

struct Candidate<N: Node> {
    graph: DirectedHypergraph<N>,
    /// Destination weight: exact when `exact` is present, otherwise a lower
    /// bound.
    bound: f64,
    exact: Option<ShortestTree<N>>,
}

/// The `k` lightest hyperpaths from `source` to `destination`, in
/// non-decreasing weight order. Fewer than `k` come back when the hypergraph
/// holds fewer distinct hyperpaths; no hyperpath at all yields an empty
/// vector.
///
/// Only B-hypergraphs are accepted: the branching step relies on every
/// hyperedge having a single head node.
pub fn k_shortest_hyperpaths<N: Node>(
    h: &DirectedHypergraph<N>,
    source: &N,
    destination: &N,
    k: usize,
    aggregator: &impl TailAggregator<N>,
) -> Result<Vec<DirectedHypergraph<N>>, KShortestError> {
    if !h.is_b_hypergraph() {
        return Err(KShortestError::NotBHypergraph);
    }
    if !h.has_node(source) {
        return Err(KShortestError::SourceNotFound(format!("{source:?}")));
    }
    if !h.has_node(destination) {
        return Err(KShortestError::DestinationNotFound(format!(
            "{destination:?}"
        )));
    }
    if k == 0 {
        return Err(KShortestError::InvalidK);
    }

    let mut paths = Vec::new();
    let mut candidates: Vec<Candidate<N>> = Vec::new();

    let tree = shortest_b_tree(h, source, aggregator)?;
    let bound = destination_weight(&tree.weight, destination);
    if bound.is_finite() {
        candidates.push(Candidate {
            graph: h.clone(),
            bound,
            exact: Some(tree),
        });
    }

    let mut emitted = 1usize;
    while emitted <= k && !candidates.is_empty() {
        // First minimal candidate wins ties, so insertion order matters.
        let mut idx = 0;
        for (j, candidate) in candidates.iter().enumerate().skip(1) {
            if candidate.bound < candidates[idx].bound {
                idx = j;
            }
        }

        match candidates[idx].exact.take() {
            None => {
                // Bound-only candidate: resolve it exactly and leave it in
                // place for reconsideration.
                let resolved = shortest_b_tree(&candidates[idx].graph, source, aggregator)?;
                let bound = destination_weight(&resolved.weight, destination);
                if bound.is_finite() {
                    candidates[idx].bound = bound;
                    candidates[idx].exact = Some(resolved);
                } else {
                    candidates.remove(idx);
                }
            }
            Some(tree) => {
                let graph = candidates.remove(idx).graph;

                // Unreachable nodes also carry `None` in the tree; keep only
                // the reached part so the map has a single root.
                let reached: Map<N, Option<EdgeId>> = tree
                    .predecessor
                    .iter()
                    .filter(|&(node, _)| destination_weight(&tree.weight, node).is_finite())
                    .map(|(node, pred)| (node.clone(), *pred))
                    .collect();
                let path = get_hyperpath_from_predecessors(&graph, &reached, source, destination)?;

                let path_predecessor: Map<N, Option<EdgeId>> = reached
                    .iter()
                    .filter(|&(node, _)| path.has_node(node))
                    .map(|(node, pred)| (node.clone(), *pred))
                    .collect();
                let path_ordering = tree
                    .ordering
                    .iter()
                    .filter(|node| path_predecessor.contains_key(*node))
                    .cloned()
                    .collect_vec();

                paths.push(path);
                if paths.len() == k {
                    break;
                }

                let branches = branching_step(&graph, &path_predecessor, &path_ordering)?;
                for (position, branch) in branches.into_iter().enumerate() {
                    let bound = compute_lower_bound(
                        &branch,
                        position,
                        &tree.predecessor,
                        &path_ordering,
                        &tree.weight,
                        destination,
                        aggregator,
                    )?;
                    if bound.is_finite() {
                        candidates.push(Candidate {
                            graph: branch,
                            bound,
                            exact: None,
                        });
                    }
                }
                emitted += 1;
            }
        }
    }

    Ok(paths)
}

fn destination_weight<N: Node>(weights: &Map<N, f64>, node: &N) -> f64 {
    weights.get(node).copied().unwrap_or(f64::INFINITY)
}

/// Splits `h` into one subgraph per adjacent position of the emitted path's
/// ordering. Branch `i` keeps positions up to `i` intact, forces every later
/// node onto its recorded predecessor hyperedge, and deletes the predecessor
/// of position `i + 1`, so its hyperpaths are exactly those that diverge
/// from the emitted path there.
fn branching_step<N: Node>(
    h: &DirectedHypergraph<N>,
    predecessor: &Map<N, Option<EdgeId>>,
    ordering: &[N],
) -> Result<Vec<DirectedHypergraph<N>>, HypergraphError> {
    let mut branches = Vec::new();
    if ordering.len() < 2 {
        return Ok(branches);
    }
    for i in 0..ordering.len() - 1 {
        let mut branch = h.clone();
        for node in &ordering[i + 2..] {
            let keep = predecessor.get(node).copied().flatten();
            let drop = branch
                .get_backward_star(node)?
                .iter()
                .copied()
                .filter(|id| Some(*id) != keep)
                .collect_vec();
            for id in drop {
                branch.remove_hyperedge(id)?;
            }
        }
        if let Some(id) = predecessor.get(&ordering[i + 1]).copied().flatten() {
            branch.remove_hyperedge(id)?;
        }
        branches.push(branch);
    }
    Ok(branches)
}

/// Lower bound on the best source-to-destination weight inside `branch`
/// (branch index `position` of the ordering), per section 3.2 of Nielsen et
/// al.: the weight of the node whose predecessor was deleted is re-derived
/// from its surviving backward star against the parent's exact weights, and
/// the change is propagated forward along the ordering through the recorded
/// predecessor hyperedges.
fn compute_lower_bound<N: Node>(
    branch: &DirectedHypergraph<N>,
    position: usize,
    predecessor: &Map<N, Option<EdgeId>>,
    ordering: &[N],
    weight: &Map<N, f64>,
    destination: &N,
    aggregator: &impl TailAggregator<N>,
) -> Result<f64, HypergraphError> {
    let Some(rejoined) = ordering.get(position + 1) else {
        return Ok(f64::INFINITY);
    };

    let backstar = branch.get_backward_star(rejoined)?;
    if backstar.is_empty() {
        // The branch cut the last hyperedge into this node; no path remains.
        return Ok(f64::INFINITY);
    }

    let mut relaxed = weight.clone();
    let mut best = f64::INFINITY;
    for &id in backstar {
        let edge = branch.get_hyperedge(id)?;
        let through = aggregator.aggregate(edge.canonical_tail(), weight) + edge.weight();
        best = best.min(through);
    }
    relaxed[rejoined] = best;

    for node in &ordering[position + 2..] {
        let Some(id) = predecessor.get(node).copied().flatten() else {
            continue;
        };
        let edge = branch.get_hyperedge(id)?;
        let through = aggregator.aggregate(edge.canonical_tail(), &relaxed) + edge.weight();
        relaxed[node] = through;
    }

    Ok(destination_weight(&relaxed, destination))
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::algorithms::shortest::SumAggregator;
    use crate::hypergraph::{DirectedHypergraph, EdgeId};

    // Figure 1 of Nielsen et al., unit weights throughout.
    fn nielsen_graph() -> (DirectedHypergraph<&'static str>, [EdgeId; 9]) {
        let mut h = DirectedHypergraph::new();
        let e1 = h.add_weighted_hyperedge(["s"], ["1"], 1.0).unwrap();
        let e2 = h.add_weighted_hyperedge(["s"], ["2"], 1.0).unwrap();
        let e3 = h.add_weighted_hyperedge(["s"], ["3"], 1.0).unwrap();
        let e4 = h.add_weighted_hyperedge(["1"], ["2"], 1.0).unwrap();
        let e5 = h.add_weighted_hyperedge(["2"], ["3"], 1.0).unwrap();
        let e6 = h.add_weighted_hyperedge(["1", "2"], ["t"], 1.0).unwrap();
        let e7 = h.add_weighted_hyperedge(["4"], ["t"], 1.0).unwrap();
        let e8 = h.add_weighted_hyperedge(["2", "3"], ["4"], 1.0).unwrap();
        let e9 = h.add_weighted_hyperedge(["4"], ["1"], 1.0).unwrap();
        (h, [e1, e2, e3, e4, e5, e6, e7, e8, e9])
    }

    fn path_weight(path: &DirectedHypergraph<&'static str>) -> f64 {
        shortest_b_tree(path, &"s", &SumAggregator).unwrap().weight[&"t"]
    }

    #[test]
    fn rejects_a_non_b_hypergraph() {
        let mut h = DirectedHypergraph::new();
        h.add_hyperedge([1], [2, 3]).unwrap();
        assert_eq!(
            k_shortest_hyperpaths(&h, &1, &2, 1, &SumAggregator),
            Err(KShortestError::NotBHypergraph),
        );
    }

    #[test]
    fn rejects_missing_endpoints_and_zero_k() {
        let mut h = DirectedHypergraph::new();
        h.add_node(1);
        h.add_node(2);
        assert_eq!(
            k_shortest_hyperpaths(&h, &3, &2, 1, &SumAggregator),
            Err(KShortestError::SourceNotFound("3".into())),
        );
        assert_eq!(
            k_shortest_hyperpaths(&h, &1, &3, 1, &SumAggregator),
            Err(KShortestError::DestinationNotFound("3".into())),
        );
        assert_eq!(
            k_shortest_hyperpaths(&h, &1, &2, 0, &SumAggregator),
            Err(KShortestError::InvalidK),
        );
    }

    #[test]
    fn branching_a_single_hyperedge_leaves_bare_nodes() {
        let mut h = DirectedHypergraph::new();
        let e1 = h.add_hyperedge(["s"], ["t"]).unwrap();
        let predecessor: Map<&str, Option<EdgeId>> =
            [("s", None), ("t", Some(e1))].into_iter().collect();
        let branches = branching_step(&h, &predecessor, &["s", "t"]).unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].hyperedge_count(), 0);
        assert_eq!(branches[0].node_count(), 2);
        assert!(branches[0].has_node(&"s") && branches[0].has_node(&"t"));
    }

    #[test]
    fn branching_matches_the_published_example() {
        let (h, [e1, e2, _, _, _, e6, ..]) = nielsen_graph();
        let ordering = ["s", "1", "2", "t"];
        let predecessor: Map<&str, Option<EdgeId>> =
            [("s", None), ("1", Some(e1)), ("2", Some(e2)), ("t", Some(e6))]
                .into_iter()
                .collect();

        let branches = branching_step(&h, &predecessor, &ordering).unwrap();
        assert_eq!(branches.len(), 3);
        for branch in &branches {
            assert_eq!(branch.node_count(), h.node_count());
            branch.check_consistency().unwrap();
        }

        // Diverge at "1": its inbound hyperedge is gone, "2" and "t" are
        // pinned to their predecessors.
        let b = &branches[0];
        assert_eq!(b.hyperedge_count(), 6);
        assert!(b.has_hyperedge(["s"], ["2"]));
        assert!(b.has_hyperedge(["s"], ["3"]));
        assert!(b.has_hyperedge(["2"], ["3"]));
        assert!(b.has_hyperedge(["2", "3"], ["4"]));
        assert!(b.has_hyperedge(["1", "2"], ["t"]));
        assert!(b.has_hyperedge(["4"], ["1"]));

        // Diverge at "2".
        let b = &branches[1];
        assert_eq!(b.hyperedge_count(), 7);
        assert!(b.has_hyperedge(["s"], ["1"]));
        assert!(b.has_hyperedge(["s"], ["3"]));
        assert!(b.has_hyperedge(["1"], ["2"]));
        assert!(b.has_hyperedge(["2"], ["3"]));
        assert!(b.has_hyperedge(["2", "3"], ["4"]));
        assert!(b.has_hyperedge(["1", "2"], ["t"]));
        assert!(b.has_hyperedge(["4"], ["1"]));

        // Diverge at "t": only its predecessor hyperedge is removed.
        let b = &branches[2];
        assert_eq!(b.hyperedge_count(), 8);
        assert!(!b.has_hyperedge(["1", "2"], ["t"]));
        assert!(b.has_hyperedge(["4"], ["t"]));
    }

    #[test]
    fn lower_bound_matches_the_published_example() {
        // H_21 of section 3.2, example 2: remove s->2 and 4->t, then branch
        // away s->1 as well. Rejoining at "1" only works through 4->1.
        let (h, [e1, e2, _, e4, _, e6, e7, ..]) = nielsen_graph();
        let mut h2 = h.clone();
        h2.remove_hyperedge(e2).unwrap();
        h2.remove_hyperedge(e7).unwrap();
        let mut branch = h2.clone();
        branch.remove_hyperedge(e1).unwrap();

        let weight: Map<&str, f64> =
            [("s", 0.0), ("1", 1.0), ("2", 2.0), ("3", 1.0), ("4", 4.0), ("t", 4.0)]
                .into_iter()
                .collect();
        let predecessor: Map<&str, Option<EdgeId>> =
            [("s", None), ("1", Some(e1)), ("2", Some(e4)), ("t", Some(e6))]
                .into_iter()
                .collect();
        let ordering = ["s", "1", "2", "t"];

        let bound = compute_lower_bound(
            &branch,
            0,
            &predecessor,
            &ordering,
            &weight,
            &"t",
            &SumAggregator,
        )
        .unwrap();
        assert_eq!(bound, 12.0);
    }

    #[test]
    fn k_one_returns_only_the_lightest_hyperpath() {
        let mut h = DirectedHypergraph::new();
        h.add_weighted_hyperedge(["s"], ["1"], 1.0).unwrap();
        h.add_weighted_hyperedge(["s"], ["2"], 1.0).unwrap();
        h.add_weighted_hyperedge(["s"], ["3"], 1.0).unwrap();
        h.add_weighted_hyperedge(["1"], ["t"], 1.0).unwrap();
        h.add_weighted_hyperedge(["2", "3"], ["t"], 1.0).unwrap();

        let paths = k_shortest_hyperpaths(&h, &"s", &"t", 1, &SumAggregator).unwrap();
        assert_eq!(paths.len(), 1);

        let path = &paths[0];
        let mut nodes = path.nodes().copied().collect_vec();
        nodes.sort_unstable();
        assert_eq!(nodes, ["1", "s", "t"]);
        assert_eq!(path.hyperedge_count(), 2);
        assert!(path.has_hyperedge(["s"], ["1"]));
        assert!(path.has_hyperedge(["1"], ["t"]));
    }

    #[test]
    fn no_path_means_an_empty_result() {
        let mut h = DirectedHypergraph::new();
        h.add_hyperedge(["s"], ["1"]).unwrap();
        h.add_hyperedge(["1", "2"], ["t"]).unwrap();
        let paths = k_shortest_hyperpaths(&h, &"s", &"t", 1, &SumAggregator).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn three_shortest_on_the_published_example() {
        let (h, _) = nielsen_graph();
        let paths = k_shortest_hyperpaths(&h, &"s", &"t", 3, &SumAggregator).unwrap();
        assert_eq!(paths.len(), 3);

        let path = &paths[0];
        let mut nodes = path.nodes().copied().collect_vec();
        nodes.sort_unstable();
        assert_eq!(nodes, ["1", "2", "s", "t"]);
        assert_eq!(path.hyperedge_count(), 3);
        assert!(path.has_hyperedge(["s"], ["1"]));
        assert!(path.has_hyperedge(["s"], ["2"]));
        assert!(path.has_hyperedge(["1", "2"], ["t"]));

        let path = &paths[1];
        let mut nodes = path.nodes().copied().collect_vec();
        nodes.sort_unstable();
        assert_eq!(nodes, ["1", "2", "s", "t"]);
        assert_eq!(path.hyperedge_count(), 3);
        assert!(path.has_hyperedge(["s"], ["1"]));
        assert!(path.has_hyperedge(["1"], ["2"]));
        assert!(path.has_hyperedge(["1", "2"], ["t"]));

        let path = &paths[2];
        let mut nodes = path.nodes().copied().collect_vec();
        nodes.sort_unstable();
        assert_eq!(nodes, ["2", "3", "4", "s", "t"]);
        assert_eq!(path.hyperedge_count(), 4);
        assert!(path.has_hyperedge(["s"], ["2"]));
        assert!(path.has_hyperedge(["s"], ["3"]));
        assert!(path.has_hyperedge(["2", "3"], ["4"]));
        assert!(path.has_hyperedge(["4"], ["t"]));
    }

    #[test]
    fn emitted_paths_are_ordered_and_distinct() {
        let (h, _) = nielsen_graph();
        let paths = k_shortest_hyperpaths(&h, &"s", &"t", 6, &SumAggregator).unwrap();
        assert!(paths.len() >= 3);

        let weights = paths.iter().map(path_weight).collect_vec();
        for pair in weights.windows(2) {
            assert!(pair[0] <= pair[1], "weights out of order: {weights:?}");
        }

        // No hyperpath comes out twice: compare canonical hyperedge sets.
        let signatures = paths
            .iter()
            .map(|path| {
                let mut edges = path
                    .hyperedge_ids()
                    .map(|id| {
                        let edge = path.get_hyperedge(id).unwrap();
                        (
                            edge.canonical_tail().as_slice().to_vec(),
                            edge.canonical_head().as_slice().to_vec(),
                        )
                    })
                    .collect_vec();
                edges.sort();
                edges
            })
            .collect_vec();
        for (i, first) in signatures.iter().enumerate() {
            for second in &signatures[i + 1..] {
                assert_ne!(first, second, "duplicate hyperpath emitted");
            }
        }
    }
}
