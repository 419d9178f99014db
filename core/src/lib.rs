//! Exact isomorphism testing for directed graphs
//!
//! ```
//! use isomorph_core::{solver, DirectedGraph};
//!
//! let a: DirectedGraph = [(0, 1), (1, 2), (2, 0)].into_iter().collect();
//! let b: DirectedGraph = [(10, 11), (11, 12), (12, 10)].into_iter().collect();
//! assert!(solver(&a, &b));
//! ```
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod algorithm;
pub mod data_structures;

pub use crate::algorithm::graph::{
    cluster, solver, solver_with_mapping, verify_mapping, GraphIsomorphism, InvariantKind,
    IsomorphismClass, IsomorphismResult, IsomorphismStatistics, NodeMap,
};
pub use crate::algorithm::traits::{Algorithm, AlgorithmError, InvariantStrategy, NodeId, Partition};
pub use crate::data_structures::{
    load_edge_list, parse_edge_list, DirectedGraph, GraphError, LoadError, LoaderConfig, NodeSet,
};
