//! Combined composition + coverage model.
//!
//! Items carry a dense row of composition bins followed by coverage columns
//! (the column-wise concatenation [`FeatureMatrix::hstack`] produces).
//! Assuming composition and coverage are conditionally independent given the
//! cluster, the combined log-likelihood is the sum of the component
//! log-likelihoods and the parameter vector is the concatenation of the
//! component parameters.

use ndarray::{s, Array1};

use crate::error::{Error, Result};
use crate::feature::{FeatureMatrix, FeatureVector};
use crate::model::{check_params, check_weights, Gaussian, Multinomial, ProbabilityModel};

/// Multinomial over the leading `split` columns, Gaussian over the rest.
#[derive(Debug, Clone)]
pub struct Combined {
    composition: Multinomial,
    coverage: Gaussian,
    split: usize,
    dim: usize,
}

impl Combined {
    /// `split` composition bins out of `dim` total columns.
    pub fn new(split: usize, dim: usize) -> Result<Self> {
        if split == 0 || split >= dim {
            return Err(Error::Config {
                parameter: "composition_dim",
                message: format!(
                    "composition bins must be in 1..{} for a combined model, got {}",
                    dim, split
                ),
            });
        }
        Ok(Combined {
            composition: Multinomial::new(split),
            coverage: Gaussian::new(dim - split),
            split,
            dim,
        })
    }

    fn fit_impl(
        &self,
        features: &FeatureMatrix,
        weights: &[f64],
        pseudo: f64,
    ) -> Result<Array1<f64>> {
        check_weights(features, weights)?;
        if features.dim() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                found: features.dim(),
            });
        }

        let cov_dim = self.dim - self.split;
        let mut counts = Array1::from_elem(self.split, pseudo);
        let mut mean = Array1::zeros(cov_dim);
        let mut mass = 0.0;
        for (row, &w) in features.rows().iter().zip(weights) {
            if w == 0.0 {
                continue;
            }
            mass += w;
            for (i, v) in row.iter_entries() {
                if i < self.split {
                    if v < 0.0 {
                        return Err(Error::Numerical(format!(
                            "negative count {} in bin {}",
                            v, i
                        )));
                    }
                    counts[i] += w * v;
                } else {
                    mean[i - self.split] += w * v;
                }
            }
        }

        let total: f64 = counts.sum();
        let probs = if total > 0.0 {
            counts / total
        } else {
            Array1::from_elem(self.split, 1.0 / self.split as f64)
        };
        if mass > 0.0 {
            mean /= mass;
        }

        let mut params = Array1::zeros(self.dim);
        params.slice_mut(s![..self.split]).assign(&probs);
        params.slice_mut(s![self.split..]).assign(&mean);
        Ok(params)
    }
}

impl ProbabilityModel for Combined {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn fit(&self, features: &FeatureMatrix, weights: &[f64]) -> Result<Array1<f64>> {
        self.fit_impl(features, weights, 0.0)
    }

    fn fit_nonzero(&self, features: &FeatureMatrix, weights: &[f64]) -> Result<Array1<f64>> {
        self.fit_impl(features, weights, 1.0)
    }

    fn log_likelihood(&self, row: &FeatureVector, params: &Array1<f64>) -> Result<f64> {
        check_params(self.dim, params)?;
        let dense = row.to_dense(self.dim);
        let comp_row = FeatureVector::Dense(dense.slice(s![..self.split]).to_owned());
        let cov_row = FeatureVector::Dense(dense.slice(s![self.split..]).to_owned());
        let comp_params = params.slice(s![..self.split]).to_owned();
        let cov_params = params.slice(s![self.split..]).to_owned();
        Ok(self.composition.log_likelihood(&comp_row, &comp_params)?
            + self.coverage.log_likelihood(&cov_row, &cov_params)?)
    }
}
