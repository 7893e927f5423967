//! Probability models linking feature vectors to clusters.
//!
//! Each model encapsulates one statistical assumption: a multinomial over
//! k-mer count signatures, an isotropic Gaussian over log-coverage profiles,
//! or the two combined under conditional independence. The clustering engine
//! is written once against [`ProbabilityModel`].

pub mod combined;
pub mod gaussian;
pub mod multinomial;

pub use combined::Combined;
pub use gaussian::Gaussian;
pub use multinomial::Multinomial;

use ndarray::Array1;

use crate::error::{Error, Result};
use crate::feature::{FeatureMatrix, FeatureVector};

/// Statistical contract between feature vectors and cluster parameters.
///
/// Parameters are a single vector of the model's dimensionality; the engine
/// treats them opaquely and only moves them between `fit*` and
/// `log_likelihood`.
pub trait ProbabilityModel: Send + Sync {
    /// Feature dimensionality this model was configured for.
    fn dimension(&self) -> usize;

    /// Maximum-likelihood parameters from the weight-aggregated features.
    ///
    /// `weights` holds one non-negative weight per matrix row (hard
    /// partitions use 0/1 weights, EM uses responsibilities). Zero total
    /// mass falls back to an uninformative parameter vector instead of
    /// failing.
    fn fit(&self, features: &FeatureMatrix, weights: &[f64]) -> Result<Array1<f64>>;

    /// As [`fit`](Self::fit), with one pseudo-count added per bin before
    /// normalizing, so every parameter entry is strictly positive.
    fn fit_nonzero(&self, features: &FeatureMatrix, weights: &[f64]) -> Result<Array1<f64>>;

    /// Log-likelihood of one feature row under the given parameters.
    fn log_likelihood(&self, row: &FeatureVector, params: &Array1<f64>) -> Result<f64>;
}

/// Model categories selectable at configuration time.
///
/// Replaces dynamic module loading with a static registry: the category
/// resolves to a concrete [`ProbabilityModel`] before any clustering work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModelKind {
    /// Multinomial over k-mer composition signatures.
    Composition,
    /// Isotropic Gaussian over per-sample log coverage.
    Coverage,
    /// Composition and coverage combined under conditional independence.
    Combined,
}

impl ModelKind {
    /// Resolves the category to a concrete model.
    ///
    /// `dim` is the full feature dimensionality; for [`ModelKind::Combined`]
    /// the leading `composition_dim` columns are composition bins and the
    /// rest coverage samples.
    pub fn resolve(
        self,
        dim: usize,
        composition_dim: Option<usize>,
    ) -> Result<Box<dyn ProbabilityModel>> {
        if dim == 0 {
            return Err(Error::Config {
                parameter: "dim",
                message: "feature dimensionality must be positive".into(),
            });
        }
        match self {
            ModelKind::Composition => Ok(Box::new(Multinomial::new(dim))),
            ModelKind::Coverage => Ok(Box::new(Gaussian::new(dim))),
            ModelKind::Combined => {
                let split = composition_dim.ok_or(Error::Config {
                    parameter: "composition_dim",
                    message: "combined model needs the composition bin count".into(),
                })?;
                Combined::new(split, dim).map(|m| Box::new(m) as Box<dyn ProbabilityModel>)
            }
        }
    }
}

/// Checks a weight vector against the matrix it is meant to aggregate.
pub(crate) fn check_weights(features: &FeatureMatrix, weights: &[f64]) -> Result<()> {
    if weights.len() != features.n_items() {
        return Err(Error::DimensionMismatch {
            expected: features.n_items(),
            found: weights.len(),
        });
    }
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(Error::Numerical(format!("invalid fit weight {}", w)));
    }
    Ok(())
}

/// Checks a parameter vector's length against the model dimensionality.
pub(crate) fn check_params(dim: usize, params: &Array1<f64>) -> Result<()> {
    if params.len() != dim {
        return Err(Error::DimensionMismatch {
            expected: dim,
            found: params.len(),
        });
    }
    Ok(())
}
