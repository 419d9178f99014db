//! Directed adjacency store with a lazily derived node set
//!
//! This module implements the simple directed relation consumed by every
//! invariant and matching routine in the crate. Edges are kept as a map from
//! source node to successor set; parallel edges collapse.
//!
//! # Theoretical Foundation
//! A directed graph is modelled as a relation `E ⊆ V × V` where `V` is not
//! stored independently: it is the projection of `E` onto both coordinates.
//! The node set is therefore a pure function of the edge relation and is kept
//! as a memoized view, emptied on every mutation and rebuilt on next read.
//! The view holds both a sorted id sequence and a hashed index, so ordered
//! iteration and O(1) membership tests share one cache fill.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::cell::OnceCell;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::algorithm::traits::NodeId;

/// Successor set of a single node
pub type NodeSet = HashSet<NodeId>;

/// Errors raised by strict graph accessors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Node has no outgoing entry in the adjacency map
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
}

/// Memoized node view of a graph
#[derive(Debug, Clone, Default)]
struct NodeIndex {
    sorted: Vec<NodeId>,
    members: NodeSet,
}

/// Directed graph over integer node identifiers
#[derive(Debug, Clone, Default)]
pub struct DirectedGraph {
    /// Forward edges: source -> successors
    adjacency: HashMap<NodeId, NodeSet>,

    /// Cached union of all sources and destinations; empty cell means stale
    nodes: OnceCell<NodeIndex>,
}

impl DirectedGraph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the edge `src -> dst`
    pub fn insert(&mut self, src: NodeId, dst: NodeId) {
        self.adjacency.entry(src).or_default().insert(dst);
        self.invalidate();
    }

    /// Removes `node` as a source and as a destination.
    ///
    /// Any source whose successor set becomes empty as a consequence is
    /// dropped in the same call, so no edge-free keys remain.
    pub fn erase(&mut self, node: NodeId) {
        self.adjacency.remove(&node);
        self.adjacency.retain(|_, successors| {
            successors.remove(&node);
            !successors.is_empty()
        });
        self.invalidate();
    }

    /// Returns a new graph with every edge flipped
    pub fn reversed(&self) -> DirectedGraph {
        let mut reversed = DirectedGraph::new();
        for (src, dst) in self.edges() {
            reversed.adjacency.entry(dst).or_default().insert(src);
        }
        reversed
    }

    /// Successors of `node`; unknown nodes have none
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.get(&node).into_iter().flatten().copied()
    }

    /// Successor set of `node`, failing when `node` has no outgoing entry
    pub fn try_successors(&self, node: NodeId) -> Result<&NodeSet, GraphError> {
        self.adjacency
            .get(&node)
            .ok_or(GraphError::NodeNotFound(node))
    }

    /// Number of outgoing edges of `node`
    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.adjacency.get(&node).map_or(0, HashSet::len)
    }

    /// Whether any successor of `node` lies in `candidates`
    pub fn has_successor_in(&self, node: NodeId, candidates: &NodeSet) -> bool {
        let Some(successors) = self.adjacency.get(&node) else {
            return false;
        };
        if successors.len() <= candidates.len() {
            successors.iter().any(|n| candidates.contains(n))
        } else {
            candidates.iter().any(|n| successors.contains(n))
        }
    }

    /// O(1) amortized; refreshes the node cache when stale
    #[inline]
    pub fn has_node(&self, node: NodeId) -> bool {
        self.index().members.contains(&node)
    }

    #[inline]
    pub fn has_edge(&self, src: NodeId, dst: NodeId) -> bool {
        self.adjacency
            .get(&src)
            .map_or(false, |successors| successors.contains(&dst))
    }

    /// Iterates over every edge as `(src, dst)`
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.adjacency
            .iter()
            .flat_map(|(&src, successors)| successors.iter().map(move |&dst| (src, dst)))
    }

    /// Node ids in ascending order, rebuilt transparently after any mutation
    pub fn nodes(&self) -> &[NodeId] {
        &self.index().sorted
    }

    fn index(&self) -> &NodeIndex {
        self.nodes.get_or_init(|| {
            let members: NodeSet = self
                .adjacency
                .iter()
                .flat_map(|(&src, successors)| std::iter::once(src).chain(successors.iter().copied()))
                .collect();
            let mut sorted: Vec<NodeId> = members.iter().copied().collect();
            sorted.sort_unstable();
            NodeIndex { sorted, members }
        })
    }

    /// Largest node identifier, if any node exists
    pub fn max_node(&self) -> Option<NodeId> {
        self.nodes().last().copied()
    }

    /// Number of nodes
    pub fn size(&self) -> usize {
        self.nodes().len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn clear(&mut self) {
        self.adjacency.clear();
        self.invalidate();
    }

    /// Total order on graphs by their sorted node-id sequences.
    ///
    /// Used for bucketing only: graphs with equal node sets compare `Equal`
    /// regardless of their edges.
    pub fn cmp_by_nodes(&self, other: &DirectedGraph) -> Ordering {
        self.nodes().iter().cmp(other.nodes().iter())
    }

    #[inline]
    fn invalidate(&mut self) {
        self.nodes.take();
    }
}

impl PartialEq for DirectedGraph {
    fn eq(&self, other: &Self) -> bool {
        self.adjacency == other.adjacency
    }
}

impl Eq for DirectedGraph {}

impl FromIterator<(NodeId, NodeId)> for DirectedGraph {
    fn from_iter<I: IntoIterator<Item = (NodeId, NodeId)>>(iter: I) -> Self {
        let mut graph = DirectedGraph::new();
        graph.extend(iter);
        graph
    }
}

impl Extend<(NodeId, NodeId)> for DirectedGraph {
    fn extend<I: IntoIterator<Item = (NodeId, NodeId)>>(&mut self, iter: I) {
        for (src, dst) in iter {
            self.adjacency.entry(src).or_default().insert(dst);
        }
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> DirectedGraph {
        [(0, 1), (1, 2), (2, 0)].into_iter().collect()
    }

    #[test]
    fn test_insert_and_membership() {
        let mut graph = DirectedGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.size(), 0);

        graph.insert(0, 1);
        graph.insert(0, 1);
        graph.insert(1, 2);

        assert_eq!(graph.size(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_node(2));
        assert!(!graph.has_node(3));
        assert!(graph.has_edge(0, 1));
        assert!(!graph.has_edge(1, 0));
        assert_eq!(graph.max_node(), Some(2));
    }

    #[test]
    fn test_node_cache_refreshes_after_mutation() {
        let mut graph = triangle();
        assert_eq!(graph.nodes().iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);

        graph.insert(2, 7);
        assert_eq!(graph.nodes().iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 7]);

        graph.clear();
        assert!(graph.nodes().is_empty());
        assert!(graph.is_empty());
        assert!(!graph.has_node(0));
    }

    #[test]
    fn test_membership_tracks_mutations() {
        let mut graph = triangle();
        assert!(graph.has_node(2));
        assert!(!graph.has_node(9));

        graph.insert(7, 9);
        assert!(graph.has_node(9));
        assert_eq!(graph.nodes(), &[0, 1, 2, 7, 9]);

        graph.erase(2);
        assert!(!graph.has_node(2));
        assert!(graph.has_node(1));
        assert_eq!(graph.nodes(), &[0, 1, 7, 9]);
    }

    #[test]
    fn test_tolerant_and_strict_lookup() {
        let graph = triangle();

        assert_eq!(graph.successors(9).count(), 0);
        assert_eq!(graph.out_degree(9), 0);
        assert_eq!(graph.try_successors(9), Err(GraphError::NodeNotFound(9)));

        let successors = graph.try_successors(0).unwrap();
        assert!(successors.contains(&1));
        assert_eq!(successors.len(), 1);
    }

    #[test]
    fn test_erase_removes_node_and_dangling_sources() {
        // 3 only points at 4; erasing 4 leaves 3 with no edges at all
        let mut graph: DirectedGraph = [(0, 1), (1, 4), (3, 4), (4, 0)].into_iter().collect();
        graph.erase(4);

        assert!(!graph.has_node(4));
        assert!(!graph.has_node(3));
        assert!(graph.try_successors(3).is_err());
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge(0, 1));
        assert_eq!(graph.nodes().iter().copied().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_erase_unknown_node_is_noop() {
        let mut graph = triangle();
        graph.erase(42);
        assert_eq!(graph, triangle());
    }

    #[test]
    fn test_reversed_flips_every_edge() {
        let graph: DirectedGraph = [(0, 1), (0, 2), (2, 2)].into_iter().collect();
        let reversed = graph.reversed();

        assert_eq!(reversed.edge_count(), 3);
        assert!(reversed.has_edge(1, 0));
        assert!(reversed.has_edge(2, 0));
        assert!(reversed.has_edge(2, 2));
        assert!(!reversed.has_edge(0, 1));
        assert_eq!(reversed.reversed(), graph);
    }

    #[test]
    fn test_equality_and_node_ordering() {
        let a = triangle();
        let b: DirectedGraph = [(0, 2), (2, 1), (1, 0)].into_iter().collect();
        let c: DirectedGraph = [(0, 1), (1, 3)].into_iter().collect();

        assert_ne!(a, b);
        assert_eq!(a.cmp_by_nodes(&b), Ordering::Equal);
        assert_eq!(a.cmp_by_nodes(&c), Ordering::Less);
        assert_eq!(c.cmp_by_nodes(&a), Ordering::Greater);
    }

    #[test]
    fn test_has_successor_in() {
        let graph: DirectedGraph = [(0, 1), (0, 2), (0, 3)].into_iter().collect();
        let hit: NodeSet = [3, 8, 9].into_iter().collect();
        let miss: NodeSet = [8].into_iter().collect();

        assert!(graph.has_successor_in(0, &hit));
        assert!(!graph.has_successor_in(0, &miss));
        assert!(!graph.has_successor_in(5, &hit));
    }
}
