//! Feature vectors and the feature matrix fed to the clustering engine.
//!
//! Composition signatures are sparse (bin, count) vectors; coverage profiles
//! and pre-computed feature rows are dense. Both live behind the
//! [`FeatureVector`] tagged variants so the E/M-step logic is written once.

use ndarray::{Array1, Array2};

use crate::error::{Error, Result};

/// Additive offset applied before the log transform so zero coverage stays
/// finite: `ln(0.1 + coverage)`.
pub const COVERAGE_LOG_OFFSET: f64 = 0.1;

/// One item's features: a sparse k-mer count signature or a dense row.
#[derive(Debug, Clone)]
pub enum FeatureVector {
    /// (bin index, count) pairs, sorted by bin, all bins in `[0, dim)`.
    Sparse(Vec<(usize, u64)>),
    /// Ordered finite values, length = dim.
    Dense(Array1<f64>),
}

impl FeatureVector {
    /// Iterates the non-zero entries as (index, value) pairs.
    pub fn iter_entries(&self) -> Box<dyn Iterator<Item = (usize, f64)> + '_> {
        match self {
            FeatureVector::Sparse(pairs) => {
                Box::new(pairs.iter().map(|&(bin, count)| (bin, count as f64)))
            }
            FeatureVector::Dense(row) => Box::new(
                row.iter()
                    .enumerate()
                    .filter(|&(_, &v)| v != 0.0)
                    .map(|(i, &v)| (i, v)),
            ),
        }
    }

    /// Dense view of the vector, materializing sparse signatures.
    pub fn to_dense(&self, dim: usize) -> Array1<f64> {
        match self {
            FeatureVector::Sparse(pairs) => {
                let mut row = Array1::zeros(dim);
                for &(bin, count) in pairs {
                    row[bin] = count as f64;
                }
                row
            }
            FeatureVector::Dense(row) => row.clone(),
        }
    }

    /// Checks the vector against the declared feature dimensionality.
    fn check_dimension(&self, dim: usize) -> Result<()> {
        match self {
            FeatureVector::Sparse(pairs) => {
                if let Some(&(bin, _)) = pairs.iter().find(|&&(bin, _)| bin >= dim) {
                    return Err(Error::DimensionMismatch {
                        expected: dim,
                        found: bin + 1,
                    });
                }
            }
            FeatureVector::Dense(row) => {
                if row.len() != dim {
                    return Err(Error::DimensionMismatch {
                        expected: dim,
                        found: row.len(),
                    });
                }
                if let Some(v) = row.iter().find(|v| !v.is_finite()) {
                    return Err(Error::Numerical(format!(
                        "non-finite feature value {}",
                        v
                    )));
                }
            }
        }
        Ok(())
    }
}

/// N feature rows with a parallel identifier sequence.
///
/// Row order and id order stay in lockstep for the lifetime of a clustering
/// run; construction fixes the dimensionality `dim` for every row.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    ids: Vec<String>,
    rows: Vec<FeatureVector>,
    dim: usize,
}

impl FeatureMatrix {
    /// Builds a matrix from parallel ids and rows, validating every row
    /// against `dim`.
    pub fn new(ids: Vec<String>, rows: Vec<FeatureVector>, dim: usize) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyInput);
        }
        if ids.len() != rows.len() {
            return Err(Error::Config {
                parameter: "ids",
                message: format!("{} ids for {} rows", ids.len(), rows.len()),
            });
        }
        for row in &rows {
            row.check_dimension(dim)?;
        }
        Ok(FeatureMatrix { ids, rows, dim })
    }

    pub fn n_items(&self) -> usize {
        self.rows.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn row(&self, i: usize) -> &FeatureVector {
        &self.rows[i]
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    /// Concatenates composition and coverage features column-wise, item by
    /// item. Ids must agree pairwise; the result is dense with
    /// `self.dim + other.dim` columns.
    pub fn hstack(&self, other: &FeatureMatrix) -> Result<FeatureMatrix> {
        if self.n_items() != other.n_items() {
            return Err(Error::DimensionMismatch {
                expected: self.n_items(),
                found: other.n_items(),
            });
        }
        for (a, b) in self.ids.iter().zip(&other.ids) {
            if a != b {
                return Err(Error::Config {
                    parameter: "ids",
                    message: format!("row id mismatch: {} vs {}", a, b),
                });
            }
        }
        let dim = self.dim + other.dim;
        let rows = self
            .rows
            .iter()
            .zip(&other.rows)
            .map(|(left, right)| {
                let mut row = Array1::zeros(dim);
                for (i, v) in left.iter_entries() {
                    row[i] = v;
                }
                for (i, v) in right.iter_entries() {
                    row[self.dim + i] = v;
                }
                FeatureVector::Dense(row)
            })
            .collect();
        FeatureMatrix::new(self.ids.clone(), rows, dim)
    }
}

/// Applies `ln(offset + v)` element-wise to a raw coverage table.
pub fn log_transform_coverage(values: &Array2<f64>) -> Array2<f64> {
    values.mapv(|v| (COVERAGE_LOG_OFFSET + v).ln())
}

/// Converts raw per-sample read-mapping counts to log coverage.
///
/// Expected coverage of a contig is `mappings * read_length / contig_length`;
/// the log transform then stabilizes variance across samples.
pub fn read_mappings_to_log_coverage(
    mappings: &Array2<f64>,
    contig_lengths: &[f64],
    read_length: f64,
) -> Result<Array2<f64>> {
    if contig_lengths.len() != mappings.nrows() {
        return Err(Error::DimensionMismatch {
            expected: mappings.nrows(),
            found: contig_lengths.len(),
        });
    }
    if read_length <= 0.0 {
        return Err(Error::Config {
            parameter: "read_length",
            message: format!("must be positive, got {}", read_length),
        });
    }
    let mut coverage = mappings.clone();
    for (mut row, &len) in coverage.rows_mut().into_iter().zip(contig_lengths) {
        if len <= 0.0 {
            return Err(Error::Numerical(format!(
                "non-positive contig length {}",
                len
            )));
        }
        row.mapv_inplace(|m| m * read_length / len);
    }
    Ok(log_transform_coverage(&coverage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};

    fn sparse(pairs: &[(usize, u64)]) -> FeatureVector {
        FeatureVector::Sparse(pairs.to_vec())
    }

    #[test]
    fn test_matrix_rejects_out_of_range_bin() {
        let err = FeatureMatrix::new(
            vec!["c1".into()],
            vec![sparse(&[(0, 3), (5, 1)])],
            4,
        )
        .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 4, .. }));
    }

    #[test]
    fn test_matrix_rejects_wrong_dense_length() {
        let err = FeatureMatrix::new(
            vec!["c1".into()],
            vec![FeatureVector::Dense(arr1(&[1.0, 2.0]))],
            3,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_matrix_rejects_non_finite() {
        let err = FeatureMatrix::new(
            vec!["c1".into()],
            vec![FeatureVector::Dense(arr1(&[1.0, f64::NAN]))],
            2,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Numerical(_)));
    }

    #[test]
    fn test_matrix_rejects_id_row_count_mismatch() {
        let err = FeatureMatrix::new(
            vec!["c1".into(), "c2".into()],
            vec![sparse(&[(0, 1)])],
            4,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config { parameter: "ids", .. }));
    }

    #[test]
    fn test_matrix_rejects_empty() {
        assert!(matches!(
            FeatureMatrix::new(vec![], vec![], 4).unwrap_err(),
            Error::EmptyInput
        ));
    }

    #[test]
    fn test_sparse_dense_agree() {
        let sp = sparse(&[(1, 2), (3, 5)]);
        let dense = sp.to_dense(4);
        assert_eq!(dense, arr1(&[0.0, 2.0, 0.0, 5.0]));
        let entries: Vec<_> = sp.iter_entries().collect();
        assert_eq!(entries, vec![(1, 2.0), (3, 5.0)]);
    }

    #[test]
    fn test_hstack_concatenates_columns() {
        let comp = FeatureMatrix::new(
            vec!["c1".into(), "c2".into()],
            vec![sparse(&[(0, 2)]), sparse(&[(1, 3)])],
            2,
        )
        .unwrap();
        let cov = FeatureMatrix::new(
            vec!["c1".into(), "c2".into()],
            vec![
                FeatureVector::Dense(arr1(&[0.5])),
                FeatureVector::Dense(arr1(&[-1.5])),
            ],
            1,
        )
        .unwrap();
        let combined = comp.hstack(&cov).unwrap();
        assert_eq!(combined.dim(), 3);
        assert_eq!(combined.row(0).to_dense(3), arr1(&[2.0, 0.0, 0.5]));
        assert_eq!(combined.row(1).to_dense(3), arr1(&[0.0, 3.0, -1.5]));
    }

    #[test]
    fn test_hstack_rejects_id_mismatch() {
        let a = FeatureMatrix::new(vec!["c1".into()], vec![sparse(&[(0, 1)])], 1).unwrap();
        let b = FeatureMatrix::new(
            vec!["c2".into()],
            vec![FeatureVector::Dense(arr1(&[1.0]))],
            1,
        )
        .unwrap();
        assert!(a.hstack(&b).is_err());
    }

    #[test]
    fn test_log_transform_finite_at_zero() {
        let raw = arr2(&[[0.0, 4.0], [10.0, 0.0]]);
        let logged = log_transform_coverage(&raw);
        assert!(logged.iter().all(|v| v.is_finite()));
        assert_relative_eq!(logged[[0, 0]], 0.1f64.ln());
        assert_relative_eq!(logged[[0, 1]], 4.1f64.ln());
    }

    #[test]
    fn test_read_mappings_conversion() {
        // 100 mappings of 100bp reads on a 10kb contig = 1x coverage.
        let mappings = arr2(&[[100.0]]);
        let logged = read_mappings_to_log_coverage(&mappings, &[10_000.0], 100.0).unwrap();
        assert_relative_eq!(logged[[0, 0]], 1.1f64.ln());
    }

    #[test]
    fn test_read_mappings_rejects_bad_lengths() {
        let mappings = arr2(&[[1.0], [2.0]]);
        assert!(read_mappings_to_log_coverage(&mappings, &[100.0], 100.0).is_err());
        assert!(read_mappings_to_log_coverage(&mappings, &[100.0, 0.0], 100.0).is_err());
    }
}
