//! Hard k-means variant of the clustering core.
//!
//! Same skeleton as EM, with hard nearest-by-log-likelihood assignment and
//! per-cluster refits over the resulting partition. The objective is the
//! total log-likelihood under the hard assignment.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;

use crate::cluster::{initial_parameters, ClusterConfig, RunResult};
use crate::error::Result;
use crate::feature::FeatureMatrix;
use crate::model::ProbabilityModel;

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
    let mut assignments = vec![0usize; n];
    let mut log_likelihood = f64::NEG_INFINITY;
    let mut previous = f64::NEG_INFINITY;
    let mut converged = false;
    let mut iterations = 0;

    for iteration in 0..config.max_iterations {
        iterations = iteration + 1;

        // Assignment step: each item goes to the cluster under which it is
        // most likely. Ties resolve to the lowest index, so a converged
        // partition cannot oscillate.
        let mut changed = false;
        log_likelihood = 0.0;
        for i in 0..n {
            let mut best = 0;
            let mut best_ll = f64::NEG_INFINITY;
            for (j, params) in parameters.iter().enumerate() {
                let ll = model.log_likelihood(features.row(i), params)?;
                if ll > best_ll {
                    best_ll = ll;
                    best = j;
                }
            }
            if assignments[i] != best {
                changed = true;
                assignments[i] = best;
            }
            log_likelihood += best_ll;
        }

        if iteration > 0 && (!changed || log_likelihood - previous < config.epsilon) {
            converged = true;
            break;
        }
        previous = log_likelihood;

        // Refit over the hard partition. Pseudo-count regularization keeps
        // the next assignment step's log-likelihoods finite and gives empty
        // clusters a valid parameter vector to come back from.
        for (j, params) in parameters.iter_mut().enumerate() {
            let weights: Vec<f64> = assignments
                .iter()
                .map(|&a| if a == j { 1.0 } else { 0.0 })
                .collect();
            *params = model.fit_nonzero(features, &weights)?;
        }
    }

    // One-hot responsibility rows mirror the hard assignment.
    let mut responsibilities = Array2::zeros((n, p));
    for (i, &j) in assignments.iter().enumerate() {
        responsibilities[[i, j]] = 1.0;
    }

    Ok(RunResult {
        assignments,
        responsibilities,
        parameters,
        log_likelihood,
        iterations,
        converged,
    })
}
