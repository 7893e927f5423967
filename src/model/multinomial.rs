//! Multinomial model over k-mer composition signatures.
//!
//! Parameters are a probability vector over the K canonical k-mer bins.
//! Fitting sums the (weighted) per-bin counts of the assigned items and
//! normalizes; the pseudo-count variant adds one to every bin first so
//! downstream log-probabilities never see a zero. The log-density uses
//! log-gamma instead of literal factorials.

use ndarray::Array1;
use statrs::function::gamma::ln_gamma;

use crate::error::{Error, Result};
use crate::feature::{FeatureMatrix, FeatureVector};
use crate::model::{check_params, check_weights, ProbabilityModel};

/// Multinomial composition model of dimensionality K.
#[derive(Debug, Clone)]
pub struct Multinomial {
    dim: usize,
}

impl Multinomial {
    pub fn new(dim: usize) -> Self {
        Multinomial { dim }
    }

    /// Weighted aggregate signature, seeded with `pseudo` in every bin.
    fn aggregate(
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

        let mut counts = Array1::from_elem(self.dim, pseudo);
        for (row, &w) in features.rows().iter().zip(weights) {
            if w == 0.0 {
                continue;
            }
            for (bin, value) in row.iter_entries() {
                if value < 0.0 {
                    return Err(Error::Numerical(format!(
                        "negative count {} in bin {}",
                        value, bin
                    )));
                }
                counts[bin] += w * value;
            }
        }

        let total: f64 = counts.sum();
        if total <= 0.0 {
            // No observations and no pseudo-counts: uninformative fallback.
            return Ok(Array1::from_elem(self.dim, 1.0 / self.dim as f64));
        }
        Ok(counts / total)
    }
}

impl ProbabilityModel for Multinomial {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn fit(&self, features: &FeatureMatrix, weights: &[f64]) -> Result<Array1<f64>> {
        self.aggregate(features, weights, 0.0)
    }

    fn fit_nonzero(&self, features: &FeatureMatrix, weights: &[f64]) -> Result<Array1<f64>> {
        self.aggregate(features, weights, 1.0)
    }

    /// `Σ_b c_b ln p_b − Σ_b ln Γ(c_b+1) + ln Γ(Σ_b c_b + 1)`
    fn log_likelihood(&self, row: &FeatureVector, params: &Array1<f64>) -> Result<f64> {
        check_params(self.dim, params)?;

        let mut ll = 0.0;
        let mut total = 0.0;
        for (bin, count) in row.iter_entries() {
            if bin >= self.dim {
                return Err(Error::DimensionMismatch {
                    expected: self.dim,
                    found: bin + 1,
                });
            }
            if count < 0.0 {
                return Err(Error::Numerical(format!(
                    "negative count {} in bin {}",
                    count, bin
                )));
            }
            if count == 0.0 {
                continue;
            }
            let p = params[bin];
            if p <= 0.0 {
                return Err(Error::Numerical(format!(
                    "zero probability in bin {} with count {}; fit_nonzero is required here",
                    bin, count
                )));
            }
            ll += count * p.ln() - ln_gamma(count + 1.0);
            total += count;
        }
        Ok(ll + ln_gamma(total + 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    fn matrix(rows: Vec<Vec<(usize, u64)>>, dim: usize) -> FeatureMatrix {
        let ids = (0..rows.len()).map(|i| format!("c{}", i)).collect();
        let rows = rows.into_iter().map(FeatureVector::Sparse).collect();
        FeatureMatrix::new(ids, rows, dim).unwrap()
    }

    #[test]
    fn test_fit_normalizes_aggregate_counts() {
        let m = Multinomial::new(4);
        let features = matrix(vec![vec![(0, 6), (1, 2)], vec![(1, 2)]], 4);
        let params = m.fit(&features, &[1.0, 1.0]).unwrap();
        assert_eq!(params, arr1(&[0.6, 0.4, 0.0, 0.0]));
    }

    #[test]
    fn test_fit_nonzero_strictly_positive() {
        let m = Multinomial::new(4);
        let features = matrix(vec![vec![(0, 10)]], 4);
        let params = m.fit_nonzero(&features, &[1.0]).unwrap();
        assert!(params.iter().all(|&p| p > 0.0));
        assert_relative_eq!(params.sum(), 1.0, epsilon = 1e-12);
        // 10 observed + 4 pseudo-counts: bin 0 holds 11/14.
        assert_relative_eq!(params[0], 11.0 / 14.0);
    }

    #[test]
    fn test_fit_empty_mass_falls_back_to_uniform() {
        let m = Multinomial::new(4);
        let features = matrix(vec![vec![(0, 5)]], 4);
        let params = m.fit(&features, &[0.0]).unwrap();
        assert_eq!(params, arr1(&[0.25, 0.25, 0.25, 0.25]));
        // The pseudo-count variant yields uniform too, via the regularizer.
        let params = m.fit_nonzero(&features, &[0.0]).unwrap();
        assert_eq!(params, arr1(&[0.25, 0.25, 0.25, 0.25]));
    }

    #[test]
    fn test_weighted_fit() {
        let m = Multinomial::new(2);
        let features = matrix(vec![vec![(0, 4)], vec![(1, 4)]], 2);
        let params = m.fit(&features, &[3.0, 1.0]).unwrap();
        assert_relative_eq!(params[0], 0.75);
        assert_relative_eq!(params[1], 0.25);
    }

    #[test]
    fn test_log_likelihood_matches_closed_form() {
        let m = Multinomial::new(2);
        let row = FeatureVector::Sparse(vec![(0, 2), (1, 1)]);
        let params = arr1(&[0.5, 0.5]);
        // ln(3! / (2! 1!)) + 2 ln 0.5 + ln 0.5 = ln 3 + 3 ln 0.5
        let expected = 3.0f64.ln() + 3.0 * 0.5f64.ln();
        assert_relative_eq!(
            m.log_likelihood(&row, &params).unwrap(),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_log_likelihood_peaks_at_matching_proportion() {
        let m = Multinomial::new(2);
        let params = arr1(&[0.8, 0.2]);
        // Fixed total of 10 counts; likelihood peaks where counts match 8:2.
        let ll_at = |a: u64| {
            m.log_likelihood(&FeatureVector::Sparse(vec![(0, a), (1, 10 - a)]), &params)
                .unwrap()
        };
        let peak = ll_at(8);
        assert!(ll_at(6) < ll_at(7));
        assert!(ll_at(7) < peak);
        assert!(ll_at(9) < peak);
        assert!(ll_at(10) < ll_at(9));
    }

    #[test]
    fn test_log_likelihood_finite_for_large_counts() {
        let m = Multinomial::new(2);
        let row = FeatureVector::Sparse(vec![(0, 1_000_000), (1, 500_000)]);
        let ll = m
            .log_likelihood(&row, &arr1(&[2.0 / 3.0, 1.0 / 3.0]))
            .unwrap();
        assert!(ll.is_finite());
    }

    #[test]
    fn test_log_likelihood_rejects_zero_probability() {
        let m = Multinomial::new(2);
        let row = FeatureVector::Sparse(vec![(1, 3)]);
        let err = m.log_likelihood(&row, &arr1(&[1.0, 0.0])).unwrap_err();
        assert!(matches!(err, Error::Numerical(_)));
    }

    #[test]
    fn test_dimension_mismatch_detected() {
        let m = Multinomial::new(2);
        let row = FeatureVector::Sparse(vec![(0, 1)]);
        assert!(m.log_likelihood(&row, &arr1(&[0.3, 0.3, 0.4])).is_err());
        let features = matrix(vec![vec![(0, 1)]], 3);
        assert!(m.fit(&features, &[1.0]).is_err());
    }
}
