//! Thin I/O adapters around the clustering core.
//!
//! FASTA contigs in (needletail), coverage and pre-computed feature tables
//! in (csv), assignments and a JSON run summary out. The core never touches
//! files; everything here produces or consumes [`FeatureMatrix`] and
//! [`RunResult`] values.

use indexmap::IndexMap;
use log::info;
use ndarray::Array2;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::bio::KmerTable;
use crate::cluster::RunResult;
use crate::error::{Error, Result};
use crate::feature::{
    log_transform_coverage, read_mappings_to_log_coverage, FeatureMatrix, FeatureVector,
};

/// Reads contigs from a FASTA file and extracts canonical k-mer signatures.
pub fn read_contigs(path: &Path, table: &KmerTable) -> Result<FeatureMatrix> {
    let mut reader =
        needletail::parse_fastx_file(path).map_err(|e| Error::Fasta(e.to_string()))?;

    let mut ids = Vec::new();
    let mut rows = Vec::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| Error::Fasta(e.to_string()))?;
        let id = String::from_utf8_lossy(record.id()).to_string();
        let signature = table.signature(&record.seq());
        ids.push(id);
        rows.push(FeatureVector::Sparse(signature));
    }

    info!(
        "read {} contigs from {} (k={}, {} bins)",
        ids.len(),
        path.display(),
        table.k(),
        table.n_bins()
    );
    FeatureMatrix::new(ids, rows, table.n_bins())
}

/// Reads a pre-computed dense feature table: header row, first column = id.
pub fn read_feature_csv(path: &Path) -> Result<FeatureMatrix> {
    let mut reader = csv::Reader::from_path(path)?;
    let dim = reader.headers()?.len().saturating_sub(1);

    let mut ids = Vec::new();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut fields = record.iter();
        let id = fields.next().ok_or(Error::EmptyInput)?.to_string();
        let values: Vec<f64> = fields
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|e| Error::Numerical(format!("bad feature value {:?}: {}", field, e)))
            })
            .collect::<Result<_>>()?;
        ids.push(id);
        rows.push(FeatureVector::Dense(values.into()));
    }

    info!("read {} feature rows from {}", ids.len(), path.display());
    FeatureMatrix::new(ids, rows, dim)
}

/// Reads a tab-separated coverage table and log-transforms it.
///
/// The first column is the contig id; `first_col..last_col` selects the
/// sample data columns (0-based, id column excluded). With `read_mappings`
/// the values are raw read-mapping counts and a `contig_length` column must
/// be present to convert them to coverage first.
pub fn read_coverage(
    path: &Path,
    first_col: usize,
    last_col: usize,
    read_length: f64,
    read_mappings: bool,
) -> Result<FeatureMatrix> {
    if last_col <= first_col {
        return Err(Error::Config {
            parameter: "sample_columns",
            message: format!("empty column range {}..{}", first_col, last_col),
        });
    }
    let mut reader = csv::ReaderBuilder::new().delimiter(b'\t').from_path(path)?;

    let headers = reader.headers()?.clone();
    // Data-column indices shift by one for the leading id column.
    let n_data_cols = headers.len().saturating_sub(1);
    if last_col > n_data_cols {
        return Err(Error::Config {
            parameter: "sample_columns",
            message: format!(
                "column range {}..{} exceeds the {} data columns",
                first_col, last_col, n_data_cols
            ),
        });
    }
    let length_col = if read_mappings {
        let idx = headers
            .iter()
            .position(|h| h == "contig_length")
            .ok_or(Error::Config {
                parameter: "coverage_file",
                message: "read-mapping input needs a contig_length column".into(),
            })?;
        Some(idx)
    } else {
        None
    };

    let mut ids = Vec::new();
    let mut values = Vec::new();
    let mut lengths = Vec::new();
    for record in reader.records() {
        let record = record?;
        ids.push(
            record
                .get(0)
                .ok_or(Error::EmptyInput)?
                .to_string(),
        );
        for col in first_col..last_col {
            let field = record.get(col + 1).unwrap_or("");
            values.push(field.parse::<f64>().map_err(|e| {
                Error::Numerical(format!("bad coverage value {:?}: {}", field, e))
            })?);
        }
        if let Some(idx) = length_col {
            let field = record.get(idx).unwrap_or("");
            lengths.push(field.parse::<f64>().map_err(|e| {
                Error::Numerical(format!("bad contig length {:?}: {}", field, e))
            })?);
        }
    }

    let n_samples = last_col - first_col;
    let raw = Array2::from_shape_vec((ids.len(), n_samples), values)
        .map_err(|e| Error::Numerical(e.to_string()))?;
    let logged = if read_mappings {
        read_mappings_to_log_coverage(&raw, &lengths, read_length)?
    } else {
        log_transform_coverage(&raw)
    };

    info!(
        "read coverage for {} contigs x {} samples from {}",
        ids.len(),
        n_samples,
        path.display()
    );
    let rows = logged
        .rows()
        .into_iter()
        .map(|row| FeatureVector::Dense(row.to_owned()))
        .collect();
    FeatureMatrix::new(ids, rows, n_samples)
}

/// Serialized run summary written alongside the assignment table.
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    log_likelihood: f64,
    iterations: usize,
    converged: bool,
    parameters: Vec<Vec<f64>>,
    responsibilities: Vec<Vec<f64>>,
    ids: &'a [String],
}

/// Writes the winning run: an assignment CSV at `path` and a JSON summary
/// (objective, fitted parameters, responsibilities) next to it.
pub fn write_result(path: &Path, ids: &[String], result: &RunResult) -> Result<()> {
    let mut assignments: IndexMap<&str, usize> = IndexMap::with_capacity(ids.len());
    for (id, &cluster) in ids.iter().zip(&result.assignments) {
        assignments.insert(id.as_str(), cluster);
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["contig_id", "cluster"])?;
    for (id, cluster) in &assignments {
        let cluster = cluster.to_string();
        writer.write_record([*id, cluster.as_str()])?;
    }
    writer.flush()?;

    let summary = RunSummary {
        log_likelihood: result.log_likelihood,
        iterations: result.iterations,
        converged: result.converged,
        parameters: result.parameters.iter().map(|p| p.to_vec()).collect(),
        responsibilities: result
            .responsibilities
            .rows()
            .into_iter()
            .map(|row| row.to_vec())
            .collect(),
        ids,
    };
    let summary_path = path.with_extension("summary.json");
    let mut file = File::create(&summary_path)?;
    file.write_all(serde_json::to_string_pretty(&summary)?.as_bytes())?;

    info!(
        "wrote assignments to {} and summary to {}",
        path.display(),
        summary_path.display()
    );
    Ok(())
}
