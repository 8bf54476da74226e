//! Weighted logistic regression.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::function::logistic::logistic;
use tracing::trace;

use super::least_squares::{check_shapes, weighted_least_squares};
use crate::error::{Error, Result};

/// Fitted probabilities are kept this far from 0 and 1.
const MU_EPS: f64 = 1e-10;

/// IRLS convergence settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrlsConfig {
    /// Iteration budget before giving up with [`Error::NonConvergence`].
    pub max_iterations: usize,
    /// Stop when `|D - D_old| / (|D| + 0.1)` falls below this.
    pub tolerance: f64,
}

impl Default for IrlsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            tolerance: 1e-8,
        }
    }
}

/// Weighted binomial deviance, `2 Σ w [y ln(y/μ) + (1-y) ln((1-y)/(1-μ))]`.
pub fn binomial_deviance(y: &DVector<f64>, mu: &DVector<f64>, w: &[f64]) -> f64 {
    fn ylogy(y: f64, mu: f64) -> f64 {
        if y > 0.0 { y * (y / mu).ln() } else { 0.0 }
    }
    2.0 * y
        .iter()
        .zip(mu.iter())
        .zip(w)
        .map(|((&yi, &mi), wi)| wi * (ylogy(yi, mi) + ylogy(1.0 - yi, 1.0 - mi)))
        .sum::<f64>()
}

fn inverse_link(eta: &DVector<f64>) -> DVector<f64> {
    eta.map(|e| logistic(e).clamp(MU_EPS, 1.0 - MU_EPS))
}

/// Weighted logistic regression by iteratively reweighted least squares.
///
/// Each step solves the weighted least squares problem on the working
/// response `z = η + (y - μ) / (μ(1 - μ))` with working weights
/// `w·μ(1 - μ)`. Starting values are `μ₀ = (w·y + ½) / (w + 1)`.
///
/// # Errors
/// [`Error::InvalidArgument`] when `y` or `w` do not match the rows of `x`,
/// [`Error::SingularFit`] from any inner solve, [`Error::NonConvergence`]
/// when the deviance has not settled within `config.max_iterations`.
pub fn weighted_logistic(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    w: &[f64],
    names: &[String],
    config: &IrlsConfig,
) -> Result<DVector<f64>> {
    check_shapes(x, y, w)?;
    let mut mu = DVector::from_iterator(
        y.len(),
        y.iter().zip(w).map(|(yi, wi)| (wi * yi + 0.5) / (wi + 1.0)),
    );
    let mut eta = mu.map(|m| (m / (1.0 - m)).ln());
    let mut deviance = binomial_deviance(y, &mu, w);

    for iteration in 1..=config.max_iterations {
        let var: Vec<f64> = mu.iter().map(|m| m * (1.0 - m)).collect();
        let working_weights: Vec<f64> = w.iter().zip(&var).map(|(wi, v)| wi * v).collect();
        let z = DVector::from_iterator(
            y.len(),
            eta.iter()
                .zip(y.iter())
                .zip(mu.iter())
                .zip(&var)
                .map(|(((e, yi), m), v)| e + (yi - m) / v),
        );

        let beta = weighted_least_squares(x, &z, &working_weights, names)?.coefficients;
        eta = x * &beta;
        mu = inverse_link(&eta);

        let previous = deviance;
        deviance = binomial_deviance(y, &mu, w);
        let change = (deviance - previous).abs() / (deviance.abs() + 0.1);
        trace!(iteration, deviance, change, "irls step");

        if change < config.tolerance {
            return Ok(beta);
        }
    }

    Err(Error::NonConvergence {
        partition: None,
        iterations: config.max_iterations,
    })
}
