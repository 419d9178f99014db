//! Bidirectional distance signatures
//!
//! This module implements the canonical node invariant used to split a graph
//! into candidate-equivalent blocks before any permutation search.
//!
//! # Mathematical Foundation
//!
//! From every source node `n` a breadth-first propagation runs over signed
//! distances: states with `d >= 0` step forward to `d + 1`, states with
//! `d <= 0` step backward to `d - 1`. Every edge traversal records its signed
//! distance at the reached node, giving a multiset (the distance profile) per
//! reached node.
//!
//! The signature of a node `v` gathers the profiles recorded at `v` by every
//! source, bucketed by the `(out-degree, in-degree)` pair of that source:
//!
//! ```text
//! sig(v) = { deg -> multiset{ profile_n(v) : n reaches v, degs(n) = deg } }
//! ```
//!
//! All ingredients are preserved by isomorphisms, so corresponding nodes of
//! isomorphic graphs share a signature. The converse does not hold.
//!
//! # Termination on cycles
//!
//! A state `(v, d)` is enqueued at most once, and only while `v` is unvisited
//! or has been visited exclusively at `-d`. Every node therefore contributes
//! states at a single magnitude, which bounds the propagation by `2|V|`
//! states and keeps the recorded multisets independent of traversal order.
//!
//! # Performance Characteristics
//!
//! - Time Complexity: O(V · (V + E)) for a full signature pass
//! - Space Complexity: O(V²) for the per-node signatures
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use log::trace;

use crate::algorithm::traits::{group_by_signature, InvariantStrategy, NodeId, Partition};
use crate::data_structures::graph::DirectedGraph;

/// `(out-degree, in-degree)` of a node
pub type Degs = (usize, usize);

/// Sorted multiset of signed distances recorded at one node
pub type DistanceProfile = Vec<i64>;

/// Per-node invariant: distance profiles bucketed by source degree pair.
/// Each bucket holds a sorted multiset of profiles.
pub type FeatureSignature = BTreeMap<Degs, Vec<DistanceProfile>>;

/// Distance-signature invariant strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistanceSignature;

impl DistanceSignature {
    pub fn new() -> Self {
        Self
    }

    /// Computes the signature of every node of `graph`
    pub fn signatures(&self, graph: &DirectedGraph) -> HashMap<NodeId, FeatureSignature> {
        let reversed = graph.reversed();

        let mut features: HashMap<NodeId, FeatureSignature> = HashMap::with_capacity(graph.size());
        for (degs, sources) in degree_buckets(graph, &reversed) {
            for source in sources {
                let profiles = propagate(source, graph, &reversed);
                trace!("source {} reached {} nodes", source, profiles.len());
                for (dst, profile) in profiles {
                    features
                        .entry(dst)
                        .or_default()
                        .entry(degs)
                        .or_default()
                        .push(profile);
                }
            }
        }

        for signature in features.values_mut() {
            for bucket in signature.values_mut() {
                bucket.sort_unstable();
            }
        }
        features
    }
}

impl InvariantStrategy for DistanceSignature {
    type Signature = FeatureSignature;

    fn name(&self) -> &'static str {
        "distance"
    }

    fn partition(&self, graph: &DirectedGraph) -> Partition<FeatureSignature> {
        group_by_signature(self.signatures(graph))
    }
}

/// Buckets nodes by `(out-degree, in-degree)`, ascending by key
pub fn degree_buckets(graph: &DirectedGraph, reversed: &DirectedGraph) -> BTreeMap<Degs, Vec<NodeId>> {
    let mut buckets: BTreeMap<Degs, Vec<NodeId>> = BTreeMap::new();
    for &node in graph.nodes() {
        let degs = (graph.out_degree(node), reversed.out_degree(node));
        buckets.entry(degs).or_default().push(node);
    }
    buckets
}

/// Frontier of a single signed-distance propagation
struct Propagation {
    queue: VecDeque<(NodeId, i64)>,
    seen: HashSet<(NodeId, i64)>,
    visited: HashSet<NodeId>,
    profiles: HashMap<NodeId, DistanceProfile>,
}

impl Propagation {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            visited: HashSet::new(),
            profiles: HashMap::new(),
        }
    }

    /// Records `dist` at `node` and enqueues the state when admissible
    fn reach(&mut self, node: NodeId, dist: i64) {
        self.profiles.entry(node).or_default().push(dist);

        let admissible = !self.visited.contains(&node) || self.seen.contains(&(node, -dist));
        if admissible && self.seen.insert((node, dist)) {
            self.visited.insert(node);
            self.queue.push_back((node, dist));
        }
    }
}

/// Runs the signed-distance propagation from `source`.
///
/// Returns the sorted distance profile of every reached node, `source`
/// included (it records distance 0).
fn propagate(
    source: NodeId,
    graph: &DirectedGraph,
    reversed: &DirectedGraph,
) -> HashMap<NodeId, DistanceProfile> {
    let mut state = Propagation::new();
    state.reach(source, 0);

    while let Some((src, dist)) = state.queue.pop_front() {
        if dist >= 0 {
            for dst in graph.successors(src) {
                state.reach(dst, dist + 1);
            }
        }
        if dist <= 0 {
            for dst in reversed.successors(src) {
                state.reach(dst, dist - 1);
            }
        }
    }

    for profile in state.profiles.values_mut() {
        profile.sort_unstable();
    }
    state.profiles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(NodeId, NodeId)]) -> DirectedGraph {
        edges.iter().copied().collect()
    }

    fn profiles_from(g: &DirectedGraph, source: NodeId) -> BTreeMap<NodeId, DistanceProfile> {
        propagate(source, g, &g.reversed()).into_iter().collect()
    }

    /// Block sizes in signature order
    fn shape<K: Ord>(partition: &Partition<K>) -> Vec<usize> {
        partition.values().map(|nodes| nodes.len()).collect()
    }

    #[test]
    fn test_propagation_on_path() {
        let g = graph(&[(0, 1), (1, 2)]);

        let from_middle = profiles_from(&g, 1);
        assert_eq!(from_middle[&1], vec![0]);
        assert_eq!(from_middle[&2], vec![1]);
        assert_eq!(from_middle[&0], vec![-1]);

        let from_head = profiles_from(&g, 0);
        assert_eq!(from_head[&2], vec![2]);
    }

    #[test]
    fn test_propagation_terminates_on_two_cycle() {
        let g = graph(&[(0, 1), (1, 0)]);
        let profiles = profiles_from(&g, 0);

        assert_eq!(profiles[&0], vec![-2, 0, 2]);
        assert_eq!(profiles[&1], vec![-1, 1]);
    }

    #[test]
    fn test_propagation_with_self_loop() {
        let g = graph(&[(0, 0), (0, 1)]);
        let profiles = profiles_from(&g, 0);

        assert_eq!(profiles[&0], vec![-1, 0, 1]);
        assert_eq!(profiles[&1], vec![1]);
    }

    #[test]
    fn test_degree_buckets() {
        let g = graph(&[(0, 1), (0, 2), (1, 2)]);
        let buckets = degree_buckets(&g, &g.reversed());

        let keys: Vec<Degs> = buckets.keys().copied().collect();
        assert_eq!(keys, vec![(0, 2), (1, 1), (2, 0)]);
        assert_eq!(buckets[&(2, 0)], vec![0]);
    }

    #[test]
    fn test_cycle_forms_single_block() {
        let g = graph(&[(0, 1), (1, 2), (2, 0)]);
        let partition = DistanceSignature.partition(&g);

        assert_eq!(partition.len(), 1);
        assert_eq!(partition.values().next().unwrap().len(), 3);
    }

    #[test]
    fn test_path_is_fully_discrete() {
        let g = graph(&[(0, 1), (1, 2)]);
        let partition = DistanceSignature.partition(&g);

        assert_eq!(shape(&partition), vec![1, 1, 1]);
    }

    #[test]
    fn test_relabeling_preserves_partition() {
        let g = graph(&[(0, 1), (0, 2), (1, 2), (2, 3), (3, 1), (3, 2)]);
        let relabel = [7, 3, 9, 1];
        let h: DirectedGraph = g.edges().map(|(u, v)| (relabel[u], relabel[v])).collect();

        let pg = DistanceSignature.partition(&g);
        let ph = DistanceSignature.partition(&h);

        assert_eq!(pg.keys().collect::<Vec<_>>(), ph.keys().collect::<Vec<_>>());
        for (nodes_g, nodes_h) in pg.values().zip(ph.values()) {
            let mut mapped: Vec<NodeId> = nodes_g.iter().map(|&n| relabel[n]).collect();
            mapped.sort_unstable();
            assert_eq!(mapped, nodes_h.iter().copied().collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_signatures_with_extreme_ids() {
        let g = graph(&[(usize::MAX, 0), (0, usize::MAX - 1)]);
        let profiles = profiles_from(&g, usize::MAX);

        assert_eq!(profiles[&usize::MAX], vec![0]);
        assert_eq!(profiles[&0], vec![1]);
        assert_eq!(profiles[&(usize::MAX - 1)], vec![2]);
        assert_eq!(shape(&DistanceSignature.partition(&g)), vec![1, 1, 1]);
    }

    #[test]
    fn test_empty_graph() {
        let partition = DistanceSignature.partition(&DirectedGraph::new());
        assert!(partition.is_empty());
    }
}
