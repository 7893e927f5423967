//! Isotropic Gaussian model over per-sample log coverage.
//!
//! Parameters are the per-sample mean vector; the variance is fixed at one,
//! which the `ln(0.1 + coverage)` transform is chosen to justify. With unit
//! variance the negative log-likelihood is squared Euclidean distance up to
//! a constant, so the k-means variant falls out of the same contract.

use ndarray::Array1;
use std::f64::consts::PI;

use crate::error::{Error, Result};
use crate::feature::{FeatureMatrix, FeatureVector};
use crate::model::{check_params, check_weights, ProbabilityModel};

/// Isotropic unit-variance Gaussian over `dim` samples.
#[derive(Debug, Clone)]
pub struct Gaussian {
    dim: usize,
}

impl Gaussian {
    pub fn new(dim: usize) -> Self {
        Gaussian { dim }
    }
}

impl ProbabilityModel for Gaussian {
    fn dimension(&self) -> usize {
        self.dim
    }

    /// Weighted mean of the assigned rows; zero total mass falls back to the
    /// zero vector (an empty cluster keeps a valid, reusable parameter).
    fn fit(&self, features: &FeatureMatrix, weights: &[f64]) -> Result<Array1<f64>> {
        check_weights(features, weights)?;
        if features.dim() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                found: features.dim(),
            });
        }

        let mut mean = Array1::zeros(self.dim);
        let mut mass = 0.0;
        for (row, &w) in features.rows().iter().zip(weights) {
            if w == 0.0 {
                continue;
            }
            mass += w;
            for (i, v) in row.iter_entries() {
                mean[i] += w * v;
            }
        }
        if mass > 0.0 {
            mean /= mass;
        }
        Ok(mean)
    }

    /// The Gaussian density is positive everywhere, so no regularization is
    /// needed; identical to [`fit`](Self::fit).
    fn fit_nonzero(&self, features: &FeatureMatrix, weights: &[f64]) -> Result<Array1<f64>> {
        self.fit(features, weights)
    }

    fn log_likelihood(&self, row: &FeatureVector, params: &Array1<f64>) -> Result<f64> {
        check_params(self.dim, params)?;
        let x = row.to_dense(self.dim);
        let sq_dist: f64 = x
            .iter()
            .zip(params.iter())
            .map(|(xi, mi)| (xi - mi).powi(2))
            .sum();
        Ok(-0.5 * self.dim as f64 * (2.0 * PI).ln() - 0.5 * sq_dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    fn matrix(rows: Vec<Vec<f64>>) -> FeatureMatrix {
        let dim = rows[0].len();
        let ids = (0..rows.len()).map(|i| format!("c{}", i)).collect();
        let rows = rows
            .into_iter()
            .map(|r| FeatureVector::Dense(Array1::from_vec(r)))
            .collect();
        FeatureMatrix::new(ids, rows, dim).unwrap()
    }

    #[test]
    fn test_fit_is_weighted_mean() {
        let g = Gaussian::new(2);
        let features = matrix(vec![vec![0.0, 2.0], vec![4.0, 6.0]]);
        let mean = g.fit(&features, &[1.0, 1.0]).unwrap();
        assert_eq!(mean, arr1(&[2.0, 4.0]));
        let skewed = g.fit(&features, &[3.0, 1.0]).unwrap();
        assert_eq!(skewed, arr1(&[1.0, 3.0]));
    }

    #[test]
    fn test_fit_empty_mass_is_zero_vector() {
        let g = Gaussian::new(2);
        let features = matrix(vec![vec![5.0, 5.0]]);
        let mean = g.fit(&features, &[0.0]).unwrap();
        assert_eq!(mean, arr1(&[0.0, 0.0]));
    }

    #[test]
    fn test_log_likelihood_peaks_at_mean() {
        let g = Gaussian::new(2);
        let mu = arr1(&[1.0, -1.0]);
        let at_mean = g
            .log_likelihood(&FeatureVector::Dense(arr1(&[1.0, -1.0])), &mu)
            .unwrap();
        let off = g
            .log_likelihood(&FeatureVector::Dense(arr1(&[2.0, -1.0])), &mu)
            .unwrap();
        assert!(at_mean > off);
        assert_relative_eq!(at_mean, -(2.0 * PI).ln());
        assert_relative_eq!(at_mean - off, 0.5);
    }

    #[test]
    fn test_log_likelihood_handles_sparse_rows() {
        let g = Gaussian::new(3);
        let sparse = FeatureVector::Sparse(vec![(1, 2)]);
        let dense = FeatureVector::Dense(arr1(&[0.0, 2.0, 0.0]));
        let mu = arr1(&[0.5, 1.0, -0.5]);
        assert_relative_eq!(
            g.log_likelihood(&sparse, &mu).unwrap(),
            g.log_likelihood(&dense, &mu).unwrap()
        );
    }

    #[test]
    fn test_dimension_mismatch_detected() {
        let g = Gaussian::new(2);
        assert!(g
            .log_likelihood(&FeatureVector::Dense(arr1(&[0.0, 0.0])), &arr1(&[0.0]))
            .is_err());
    }
}
