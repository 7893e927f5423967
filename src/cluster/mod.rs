//! Clustering engine: randomized restarts around an EM or k-means core.
//!
//! Every run owns its parameters and responsibility matrix; runs share only
//! the read-only feature matrix and model. The final best-by-objective
//! reduction is the single synchronization point, so serial and parallel
//! scheduling produce identical results for a fixed seed.

mod em;
mod kmeans;

use log::{debug, info};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::feature::FeatureMatrix;
use crate::model::ProbabilityModel;

/// Iteration scheme for one clustering attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Algorithm {
    /// Soft responsibilities, log-sum-exp E-step, weighted refits.
    Em,
    /// Hard nearest-by-likelihood assignment.
    Kmeans,
}

/// Run configuration, validated before any work begins.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Number of clusters `p`.
    pub clusters: usize,
    /// Convergence tolerance on the objective gain per iteration.
    pub epsilon: f64,
    /// Iteration cap per run; hitting it is not an error.
    pub max_iterations: usize,
    /// Independent randomized restarts.
    pub runs: usize,
    /// Execute restarts sequentially instead of on the rayon pool.
    pub serial: bool,
    /// Base seed; run `r` derives seed `base + r`. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl ClusterConfig {
    pub fn validate(&self, n_items: usize) -> Result<()> {
        if self.clusters == 0 {
            return Err(Error::Config {
                parameter: "clusters",
                message: "cluster count must be positive".into(),
            });
        }
        if self.clusters > n_items {
            return Err(Error::Config {
                parameter: "clusters",
                message: format!(
                    "cluster count {} exceeds item count {}",
                    self.clusters, n_items
                ),
            });
        }
        if !(self.epsilon > 0.0) {
            return Err(Error::Config {
                parameter: "epsilon",
                message: format!("tolerance must be positive, got {}", self.epsilon),
            });
        }
        if self.max_iterations == 0 {
            return Err(Error::Config {
                parameter: "iterations",
                message: "iteration cap must be positive".into(),
            });
        }
        if self.runs == 0 {
            return Err(Error::Config {
                parameter: "runs",
                message: "run count must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Outcome of one clustering attempt; the unit compared across restarts.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Hard cluster index per item (row-wise argmax of responsibilities).
    pub assignments: Vec<usize>,
    /// N x p soft assignment weights; one-hot rows for k-means.
    pub responsibilities: Array2<f64>,
    /// Fitted parameter vector per cluster.
    pub parameters: Vec<Array1<f64>>,
    /// Total log-likelihood; the selection objective.
    pub log_likelihood: f64,
    /// Iterations actually executed.
    pub iterations: usize,
    /// Whether the tolerance was reached before the iteration cap.
    pub converged: bool,
}

/// Clusters the feature matrix, returning the best of `config.runs`
/// independent attempts.
///
/// `initial` optionally pins the starting parameter vectors (all runs then
/// share them); otherwise each run seeds its clusters from random singleton
/// items.
pub fn cluster(
    algorithm: Algorithm,
    model: &dyn ProbabilityModel,
    features: &FeatureMatrix,
    config: &ClusterConfig,
    initial: Option<&[Array1<f64>]>,
) -> Result<RunResult> {
    config.validate(features.n_items())?;
    if model.dimension() != features.dim() {
        return Err(Error::DimensionMismatch {
            expected: model.dimension(),
            found: features.dim(),
        });
    }
    if let Some(centroids) = initial {
        if centroids.len() != config.clusters {
            return Err(Error::Config {
                parameter: "centroids",
                message: format!(
                    "{} initial centroids for {} clusters",
                    centroids.len(),
                    config.clusters
                ),
            });
        }
        for c in centroids {
            if c.len() != model.dimension() {
                return Err(Error::DimensionMismatch {
                    expected: model.dimension(),
                    found: c.len(),
                });
            }
        }
    }

    let base_seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let attempt = |run: usize| -> Result<RunResult> {
        let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(run as u64));
        let result = match algorithm {
            Algorithm::Em => em::run(model, features, config, initial, &mut rng),
            Algorithm::Kmeans => kmeans::run(model, features, config, initial, &mut rng),
        }?;
        debug!(
            "run {}: log-likelihood {:.6}, {} iterations, converged: {}",
            run, result.log_likelihood, result.iterations, result.converged
        );
        Ok(result)
    };

    let results: Vec<RunResult> = if config.serial || config.runs == 1 {
        (0..config.runs).map(attempt).collect::<Result<_>>()?
    } else {
        (0..config.runs)
            .into_par_iter()
            .map(attempt)
            .collect::<Result<_>>()?
    };

    // Deterministic reduction: first-seen wins ties in run order regardless
    // of scheduling.
    let best = results
        .into_iter()
        .reduce(|best, candidate| {
            if candidate.log_likelihood > best.log_likelihood {
                candidate
            } else {
                best
            }
        })
        .ok_or(Error::EmptyInput)?;

    info!(
        "best of {} runs: log-likelihood {:.6} ({} clusters, {} items)",
        config.runs,
        best.log_likelihood,
        config.clusters,
        features.n_items()
    );
    Ok(best)
}

/// Initial per-cluster parameters: user-supplied centroids, or pseudo-count
/// fits of `p` distinct randomly sampled singleton items.
fn initial_parameters(
    model: &dyn ProbabilityModel,
    features: &FeatureMatrix,
    config: &ClusterConfig,
    initial: Option<&[Array1<f64>]>,
    rng: &mut StdRng,
) -> Result<Vec<Array1<f64>>> {
    if let Some(centroids) = initial {
        return Ok(centroids.to_vec());
    }
    let n = features.n_items();
    let chosen = rand::seq::index::sample(rng, n, config.clusters);
    chosen
        .into_iter()
        .map(|item| {
            let mut weights = vec![0.0; n];
            weights[item] = 1.0;
            model.fit_nonzero(features, &weights)
        })
        .collect()
}

/// Numerically stable `ln Σ exp(x_i)`.
fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

/// Hard assignment per row: index of the maximum responsibility, first index
/// on ties.
fn argmax_rows(responsibilities: &Array2<f64>) -> Vec<usize> {
    responsibilities
        .rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            let mut best_value = f64::NEG_INFINITY;
            for (j, &v) in row.iter().enumerate() {
                if v > best_value {
                    best_value = v;
                    best = j;
                }
            }
            best
        })
        .collect()
}
