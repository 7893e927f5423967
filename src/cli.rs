//! Command-line argument definitions.

use clap::Parser;
use std::path::PathBuf;

use metabin::cluster::Algorithm;
use metabin::model::ModelKind;

/// Cluster metagenomic contigs into genome bins by k-mer composition and
/// multi-sample coverage.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Probability model to cluster under.
    #[arg(short, long, value_enum, default_value_t = ModelKind::Composition)]
    pub model: ModelKind,

    /// Clustering algorithm.
    #[arg(short, long, value_enum, default_value_t = Algorithm::Em)]
    pub algorithm: Algorithm,

    /// FASTA file with contigs (composition and combined models).
    #[arg(long)]
    pub composition_file: Option<PathBuf>,

    /// Tab-separated coverage table (coverage and combined models).
    #[arg(long)]
    pub coverage_file: Option<PathBuf>,

    /// Treat the input files as pre-computed dense feature CSVs.
    #[arg(long)]
    pub feature_vectors: bool,

    /// Number of clusters.
    #[arg(short = 'c', long)]
    pub clusters: usize,

    /// K-mer word length for composition signatures.
    #[arg(short = 'k', long, default_value_t = 4)]
    pub kmer: usize,

    /// Convergence tolerance on the log-likelihood gain per iteration.
    #[arg(short, long, default_value_t = 1e-6)]
    pub epsilon: f64,

    /// Maximum iterations per run.
    #[arg(short, long, default_value_t = 100)]
    pub iterations: usize,

    /// Independent randomized runs; the best by log-likelihood wins.
    #[arg(short, long, default_value_t = 1)]
    pub runs: usize,

    /// Execute runs sequentially instead of in parallel.
    #[arg(long)]
    pub serial: bool,

    /// Base random seed for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,

    /// First sample data column in the coverage table (0-based, id column
    /// excluded).
    #[arg(long, default_value_t = 0)]
    pub first_data: usize,

    /// One past the last sample data column in the coverage table.
    #[arg(long)]
    pub last_data: Option<usize>,

    /// Sequencing read length, used to convert read mappings to coverage.
    #[arg(long, default_value_t = 100.0)]
    pub read_length: f64,

    /// Coverage table holds raw read-mapping counts (needs a contig_length
    /// column) rather than coverage values.
    #[arg(long)]
    pub read_mappings: bool,

    /// Output path for the assignment CSV; a JSON summary lands next to it.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Worker threads for parallel runs (0 = all cores).
    #[arg(short = 't', long, default_value_t = 0)]
    pub threads: usize,
}
