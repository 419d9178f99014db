//! Delimited edge-list reader
//!
//! Each non-blank line carries one directed edge as two integer cells,
//! `src<delim>dst`. Records that cannot be read as exactly two non-negative
//! integers are skipped with a warning; they never reach the graph.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::traits::NodeId;
use crate::data_structures::graph::DirectedGraph;

/// Edge-list reading errors
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read edge list: {0}")]
    Read(#[from] io::Error),
}

/// Loader settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Cell separator within a line
    pub delimiter: char,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

/// Reads an edge list from any buffered source
pub fn parse_edge_list<R: BufRead>(
    reader: R,
    config: &LoaderConfig,
) -> Result<DirectedGraph, LoadError> {
    let mut graph = DirectedGraph::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let mut row: Vec<NodeId> = Vec::with_capacity(2);
        for cell in line.split(config.delimiter).map(str::trim) {
            if cell.is_empty() {
                continue;
            }
            match cell.parse::<NodeId>() {
                Ok(value) => row.push(value),
                Err(_) => warn!("line {}: invalid node id {:?}", line_no, cell),
            }
        }

        match row.as_slice() {
            &[src, dst] => graph.insert(src, dst),
            [] => {}
            _ => warn!(
                "line {}: expected 2 node ids, found {}; record skipped",
                line_no,
                row.len()
            ),
        }
    }

    Ok(graph)
}

/// Reads an edge list from a file
pub fn load_edge_list(path: &Path, config: &LoaderConfig) -> Result<DirectedGraph, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_edge_list(BufReader::new(file), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> DirectedGraph {
        parse_edge_list(Cursor::new(text), &LoaderConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_well_formed() {
        let graph = parse("0,1\n1,2\n2,0\n");
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.has_edge(2, 0));
    }

    #[test]
    fn test_blank_lines_and_whitespace() {
        let graph = parse("\n 0 , 1 \n\n   \n1,2");
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge(0, 1));
    }

    #[test]
    fn test_malformed_records_skipped() {
        let graph = parse("0,1\nx,2\n3\n4,5,6\n-1,2\n7,,8\n");
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(7, 8));
        assert!(!graph.has_node(3));
        assert!(!graph.has_node(4));
    }

    #[test]
    fn test_custom_delimiter() {
        let config = LoaderConfig { delimiter: '\t' };
        let graph = parse_edge_list(Cursor::new("0\t1\n1\t0\n"), &config).unwrap();
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(1, 0));
    }

    #[test]
    fn test_missing_file() {
        let result = load_edge_list(Path::new("/nonexistent/graph.csv"), &LoaderConfig::default());
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}
