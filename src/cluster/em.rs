//! Expectation-Maximization variant of the clustering core.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;

use crate::cluster::{argmax_rows, initial_parameters, log_sum_exp, ClusterConfig, RunResult};
use crate::error::Result;
use crate::feature::FeatureMatrix;
use crate::model::ProbabilityModel;

/// One EM attempt: soft E-step via log-sum-exp, pseudo-count-regularized
/// weighted M-step, stopping when the total log-likelihood gain drops below
/// the tolerance or the iteration cap hits.
pub(super) fn run(
    model: &dyn ProbabilityModel,
    features: &FeatureMatrix,
    config: &ClusterConfig,
    initial: Option<&[Array1<f64>]>,
    rng: &mut StdRng,
) -> Result<RunResult> {
    let n = features.n_items();
    let p = config.clusters;

    let mut parameters = initial_parameters(model, features, config, initial, rng)?;
    let mut responsibilities = Array2::zeros((n, p));
    let mut log_likelihood = f64::NEG_INFINITY;
    let mut previous = f64::NEG_INFINITY;
    let mut converged = false;
    let mut iterations = 0;

    for iteration in 0..config.max_iterations {
        iterations = iteration + 1;

        // E-step: responsibilities from per-cluster log-likelihoods, each
        // row normalized in log space to avoid underflow.
        log_likelihood = 0.0;
        let mut row_lls = vec![0.0; p];
        for i in 0..n {
            for (j, params) in parameters.iter().enumerate() {
                row_lls[j] = model.log_likelihood(features.row(i), params)?;
            }
            let norm = log_sum_exp(&row_lls);
            log_likelihood += norm;
            for j in 0..p {
                responsibilities[[i, j]] = (row_lls[j] - norm).exp();
            }
        }

        if iteration > 0 && log_likelihood - previous < config.epsilon {
            converged = true;
            break;
        }
        previous = log_likelihood;

        // M-step: weighted refit per cluster. The pseudo-count fallback
        // keeps clusters with no responsibility mass alive and eligible to
        // reacquire items.
        for (j, params) in parameters.iter_mut().enumerate() {
            let weights: Vec<f64> = responsibilities.column(j).to_vec();
            *params = model.fit_nonzero(features, &weights)?;
        }
    }

    Ok(RunResult {
        assignments: argmax_rows(&responsibilities),
        responsibilities,
        parameters,
        log_likelihood,
        iterations,
        converged,
    })
}
