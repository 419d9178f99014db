//! Core trait definitions shared by the invariant and matching algorithms
//!
//! This module fixes the vocabulary every algorithm in the crate speaks: node
//! identifiers, node partitions, the pluggable invariant policy and the
//! string-keyed parameter contract used for configuration.
//!
//! # Key Design Principles
//! - Invariants are policies: any `InvariantStrategy` may drive the matcher
//! - Partitions are ordered maps, so block iteration order is reproducible
//! - Parameters are validated at the point they are set
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::data_structures::graph::DirectedGraph;

/// Non-negative node identifier
pub type NodeId = usize;

/// Nodes grouped by invariant value, ordered by that value
pub type Partition<K> = BTreeMap<K, BTreeSet<NodeId>>;

/// Node invariant policy.
///
/// # Invariants
/// - Nodes related by an automorphism receive equal signatures
/// - Signatures of isomorphic graphs are comparable: corresponding nodes of
///   two isomorphic graphs receive equal signatures
/// - The result does not depend on hash iteration order
pub trait InvariantStrategy: Debug {
    /// Per-node invariant value
    type Signature: Ord + Clone + Debug;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Partitions the nodes of `graph` into equivalence blocks
    fn partition(&self, graph: &DirectedGraph) -> Partition<Self::Signature>;
}

/// Groups `(node, signature)` pairs into a partition
pub fn group_by_signature<K, I>(assignments: I) -> Partition<K>
where
    K: Ord,
    I: IntoIterator<Item = (NodeId, K)>,
{
    let mut partition: Partition<K> = BTreeMap::new();
    for (node, signature) in assignments {
        partition.entry(signature).or_default().insert(node);
    }
    partition
}

/// Parameter type enumeration for type-safe parameter handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    Integer,
    Enum(Vec<String>),
}

/// Algorithm parameter description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmParameter {
    pub name: String,
    pub value: String,
    pub value_type: ParameterType,
}

/// Errors raised while configuring algorithms
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlgorithmError {
    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
}

/// Configurable algorithm
pub trait Algorithm: Debug {
    /// Returns the algorithm's descriptive name
    fn name(&self) -> &'static str;

    /// Returns the algorithm's category
    fn category(&self) -> &'static str;

    /// Returns the algorithm's description with complexity notes
    fn description(&self) -> String;

    /// Returns supported parameters with their current values
    fn parameters(&self) -> Vec<AlgorithmParameter>;

    /// Sets algorithm parameter with type validation
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError>;

    /// Gets algorithm parameter value
    fn get_parameter(&self, name: &str) -> Option<String>;
}
