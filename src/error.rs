use thiserror::Error;

/// Errors raised by the binning core and its I/O adapters.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid run configuration, rejected before any work begins.
    #[error("invalid configuration: {parameter}: {message}")]
    Config {
        parameter: &'static str,
        message: String,
    },

    /// A feature row disagrees with the model's configured dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Zero or negative probability mass where a regularized fit was required.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// The feature matrix contains no items.
    #[error("empty input")]
    EmptyInput,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// FASTA parsing failure from needletail.
    #[error("FASTA error: {0}")]
    Fasta(String),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
