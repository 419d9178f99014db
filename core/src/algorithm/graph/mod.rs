//! Directed graph isomorphism: invariants, matching and clustering
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod clustering;
pub mod invariant;
pub mod isomorphism;
pub mod refinement;

pub use self::clustering::{cluster, IsomorphismClass};
pub use self::invariant::{DistanceSignature, FeatureSignature};
pub use self::isomorphism::{
    solver, solver_with_mapping, verify_mapping, GraphIsomorphism, InvariantKind,
    IsomorphismResult, IsomorphismStatistics, NodeMap,
};
pub use self::refinement::{ColorRefinement, TupleRefinement};
