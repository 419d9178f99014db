//! Graph storage and input adapters
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod graph;
pub mod loader;

pub use self::graph::{DirectedGraph, GraphError, NodeSet};
pub use self::loader::{load_edge_list, parse_edge_list, LoadError, LoaderConfig};
