//! # Isomorph CLI
//!
//! Command-line driver for isomorph-core: compares two edge-list graphs, or
//! groups every edge-list graph of a directory into isomorphism classes.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use isomorph_core::{
    cluster, load_edge_list, Algorithm, DirectedGraph, GraphIsomorphism, InvariantKind,
    LoaderConfig,
};
use log::{debug, info, LevelFilter};
use rayon::prelude::*;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "isomorph")]
#[command(author, version, about = "Exact isomorphism testing for directed edge-list graphs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: SolverOptions,
}

#[derive(Args)]
struct SolverOptions {
    /// Node invariant guiding the search: distance, color or tuple
    #[arg(long, global = true, default_value_t = InvariantKind::Distance)]
    strategy: InvariantKind,

    /// Tuple size for the tuple strategy
    #[arg(long, global = true, default_value_t = 2)]
    dimension: usize,

    /// Largest tuple space coloured by the tuple strategy before it uses 1-WL
    #[arg(long, global = true, default_value_t = 1 << 16)]
    max_tuples: usize,

    /// Cell delimiter of the edge-list files
    #[arg(long, global = true, default_value_t = ',')]
    delimiter: char,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether two edge-list graphs are isomorphic
    Compare {
        /// First edge-list file
        first: PathBuf,
        /// Second edge-list file
        second: PathBuf,
    },
    /// Group the edge-list graphs of a directory into isomorphism classes
    Cluster {
        /// Directory holding one edge-list file per graph
        dir: PathBuf,
        /// Extension of the files to load
        #[arg(long, default_value = "csv")]
        extension: String,
    },
}

/// Class of files sharing one isomorphism type
#[derive(Debug, Serialize)]
struct FileClass<'a> {
    representative: &'a str,
    members: Vec<&'a str>,
}

impl SolverOptions {
    fn solver(&self) -> Result<GraphIsomorphism> {
        let mut solver = GraphIsomorphism::with_strategy(self.strategy);
        solver
            .set_parameter("tuple_dimension", &self.dimension.to_string())
            .context("invalid --dimension")?;
        solver
            .set_parameter("max_tuples", &self.max_tuples.to_string())
            .context("invalid --max-tuples")?;
        Ok(solver)
    }

    fn loader(&self) -> LoaderConfig {
        LoaderConfig {
            delimiter: self.delimiter,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.options.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    match &cli.command {
        Commands::Compare { first, second } => compare(&cli.options, first, second),
        Commands::Cluster { dir, extension } => cluster_dir(&cli.options, dir, extension),
    }
}

fn load(path: &Path, config: &LoaderConfig) -> Result<DirectedGraph> {
    load_edge_list(path, config).with_context(|| format!("loading {}", path.display()))
}

fn compare(options: &SolverOptions, first: &Path, second: &Path) -> Result<()> {
    let mut solver = options.solver()?;
    let config = options.loader();

    let start = Instant::now();
    let a = load(first, &config)?;
    let b = load(second, &config)?;
    info!(
        "Loaded {} nodes / {} edges and {} nodes / {} edges in {:.3}s",
        a.size(),
        a.edge_count(),
        b.size(),
        b.edge_count(),
        start.elapsed().as_secs_f64()
    );

    let solve_start = Instant::now();
    let result = solver.detect_isomorphism(&a, &b);
    info!(
        "Solved with {} strategy in {:.3}s",
        solver.strategy(),
        solve_start.elapsed().as_secs_f64()
    );

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.is_isomorphic {
        println!("Yes");
    } else {
        println!("No");
    }
    Ok(())
}

/// Files directly inside `dir` carrying `extension`, sorted by path
fn collect_graph_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_label(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
}

fn cluster_dir(options: &SolverOptions, dir: &Path, extension: &str) -> Result<()> {
    let mut solver = options.solver()?;
    let config = options.loader();

    let files = collect_graph_files(dir, extension)?;
    debug!("Found {} .{} files in {}", files.len(), extension, dir.display());

    let start = Instant::now();
    let graphs = files
        .par_iter()
        .map(|path| load(path, &config))
        .collect::<Result<Vec<_>>>()?;
    info!("Loaded {} graphs in {:.3}s", graphs.len(), start.elapsed().as_secs_f64());

    let cluster_start = Instant::now();
    let classes = cluster(&mut solver, &graphs);
    info!(
        "Found {} classes in {:.3}s",
        classes.len(),
        cluster_start.elapsed().as_secs_f64()
    );

    let labelled: Vec<FileClass> = classes
        .iter()
        .map(|class| FileClass {
            representative: file_label(&files[class.representative]),
            members: class.members.iter().map(|&m| file_label(&files[m])).collect(),
        })
        .collect();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&labelled)?);
    } else {
        for (index, class) in labelled.iter().enumerate() {
            println!("class {}: {}", index + 1, class.members.join(" "));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "isomorph", "cluster", "graphs", "--strategy", "tuple", "--dimension", "3",
            "--extension", "txt", "--json", "--max-tuples", "500",
        ]);
        assert_eq!(cli.options.strategy, InvariantKind::Tuple);
        assert_eq!(cli.options.dimension, 3);
        assert_eq!(cli.options.solver().unwrap().max_tuples(), 500);
        assert!(cli.options.json);
        assert!(matches!(cli.command, Commands::Cluster { ref extension, .. } if extension == "txt"));

        assert!(Cli::try_parse_from(["isomorph", "compare", "a", "b", "--strategy", "fast"]).is_err());
    }

    #[test]
    fn test_solver_rejects_small_dimension() {
        let cli = Cli::parse_from(["isomorph", "compare", "a", "b", "--dimension", "1"]);
        assert!(cli.options.solver().is_err());
    }

    #[test]
    fn test_collect_graph_files() {
        let dir = std::env::temp_dir().join(format!("isomorph-cli-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["b.csv", "a.csv", "notes.txt"] {
            fs::write(dir.join(name), "0,1\n").unwrap();
        }

        let files = collect_graph_files(&dir, "csv").unwrap();
        let labels: Vec<&str> = files.iter().map(|p| file_label(p)).collect();
        assert_eq!(labels, vec!["a.csv", "b.csv"]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
