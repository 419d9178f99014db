//! Isomorphism classes of a graph collection
//!
//! Graphs are grouped greedily: each graph joins the first existing class
//! whose representative it is isomorphic to, otherwise it founds a new
//! class. Isomorphism is an equivalence relation, so the grouping does not
//! depend on which member represents a class.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use log::debug;
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::isomorphism::GraphIsomorphism;
use crate::data_structures::graph::DirectedGraph;

/// Graphs of one isomorphism class, as indices into the input slice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsomorphismClass {
    /// First member encountered
    pub representative: usize,
    /// All members in input order, representative included
    pub members: Vec<usize>,
}

/// Partitions `graphs` into isomorphism classes, in order of first appearance
pub fn cluster(solver: &mut GraphIsomorphism, graphs: &[DirectedGraph]) -> Vec<IsomorphismClass> {
    let mut classes: Vec<IsomorphismClass> = Vec::new();

    for (index, graph) in graphs.iter().enumerate() {
        let home = classes.iter().position(|class| {
            let representative = &graphs[class.representative];
            representative.size() == graph.size()
                && representative.edge_count() == graph.edge_count()
                && solver.is_isomorphic(representative, graph)
        });

        match home {
            Some(position) => classes[position].members.push(index),
            None => classes.push(IsomorphismClass {
                representative: index,
                members: vec![index],
            }),
        }
    }

    debug!("{} graphs fell into {} classes", graphs.len(), classes.len());
    classes
}
