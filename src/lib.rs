//! Probabilistic binning of metagenomic contigs.
//!
//! Contigs are clustered into putative genome bins from two signals: the
//! canonical k-mer composition of their sequence and their log-coverage
//! profile across samples. The core is an EM / k-means engine over a
//! pluggable [`model::ProbabilityModel`], with multiple randomized restarts
//! and best-by-likelihood selection.
//!
//! Typical flow: build a [`bio::KmerTable`], extract a
//! [`feature::FeatureMatrix`] from FASTA and/or coverage tables via [`io`],
//! resolve a [`model::ModelKind`], and call [`cluster::cluster`].

pub mod bio;
pub mod cluster;
pub mod error;
pub mod feature;
pub mod io;
pub mod model;

pub use bio::KmerTable;
pub use cluster::{cluster, Algorithm, ClusterConfig, RunResult};
pub use error::{Error, Result};
pub use feature::{FeatureMatrix, FeatureVector};
pub use model::{ModelKind, ProbabilityModel};
