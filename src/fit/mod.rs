//! Weighted model fits for one replicate.

pub mod least_squares;
pub mod logistic;

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

pub use least_squares::{WlsSolution, weighted_least_squares, weighted_sigma};
pub use logistic::{IrlsConfig, binomial_deviance, weighted_logistic};

use crate::error::{Error, Result};
use crate::model::{Family, ModelSpec};
use crate::sample::Partition;

/// One fit's output: coefficients, plus the dispersion for the continuous family.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapReplicate {
    names: Arc<[String]>,
    coefficients: Vec<f64>,
    dispersion: Option<f64>,
}

impl BootstrapReplicate {
    /// Assemble a replicate; `coefficients` follows the order of `names`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when the lengths disagree.
    pub fn new(names: Arc<[String]>, coefficients: Vec<f64>, dispersion: Option<f64>) -> Result<Self> {
        if names.len() != coefficients.len() {
            return Err(Error::InvalidArgument(format!(
                "{} coefficient names but {} values",
                names.len(),
                coefficients.len()
            )));
        }
        Ok(Self { names, coefficients, dispersion })
    }

    /// Coefficient names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Coefficient values, aligned with [`names`](Self::names).
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Value of one coefficient.
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        let idx = self.names.iter().position(|n| n == name)?;
        self.coefficients.get(idx).copied()
    }

    /// Residual scale; `None` for the binary family.
    pub fn dispersion(&self) -> Option<f64> {
        self.dispersion
    }

    pub(crate) fn shares_names_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.names, &other.names) || self.names == other.names
    }
}

/// A partition resolved against a model: design matrix and response.
///
/// Built once per partition and refitted under every replicate's weights.
#[derive(Debug, Clone)]
pub struct Design {
    family: Family,
    names: Arc<[String]>,
    x: DMatrix<f64>,
    y: DVector<f64>,
}

impl Design {
    /// Resolve `spec` against `partition`.
    ///
    /// # Errors
    /// [`Error::SchemaMismatch`] for missing columns, [`Error::InvalidArgument`]
    /// for a model without coefficients, an empty partition, non-finite
    /// data or a binary response outside `[0, 1]`.
    pub fn new(spec: &ModelSpec, partition: &Partition) -> Result<Self> {
        if spec.width() == 0 {
            return Err(Error::InvalidArgument(format!("model `{spec}` has no coefficients")));
        }
        if partition.is_empty() {
            return Err(Error::InvalidArgument("partition has no rows".into()));
        }
        let x = spec.design(partition)?;
        let y = DVector::from_column_slice(spec.response_values(partition)?);
        Ok(Self {
            family: spec.family,
            names: spec.coefficient_names().into(),
            x,
            y,
        })
    }

    /// Number of rows, `n_sub`.
    pub fn rows(&self) -> usize {
        self.x.nrows()
    }

    /// Coefficient names shared by every replicate fitted from this design.
    pub fn names(&self) -> &Arc<[String]> {
        &self.names
    }

    /// Fit under `weights` (one per row).
    ///
    /// # Errors
    /// [`Error::SingularFit`], [`Error::NonConvergence`], or
    /// [`Error::InvalidArgument`] for a weight vector of the wrong length.
    pub fn fit(&self, weights: &[f64], irls: &IrlsConfig) -> Result<BootstrapReplicate> {
        let (coefficients, dispersion) = match self.family {
            Family::Continuous => {
                let solution = weighted_least_squares(&self.x, &self.y, weights, &self.names)?;
                let sigma = weighted_sigma(&self.x, &self.y, weights, &solution)?;
                (solution.coefficients, Some(sigma))
            }
            Family::Binary => {
                let beta = weighted_logistic(&self.x, &self.y, weights, &self.names, irls)?;
                (beta, None)
            }
        };
        BootstrapReplicate::new(Arc::clone(&self.names), coefficients.iter().copied().collect(), dispersion)
    }
}

/// Fit `spec` to `partition` under `weights`.
///
/// Convenience over [`Design`] for one-off fits; repeated fits of the same
/// partition should build the [`Design`] once.
///
/// # Errors
/// See [`Design::new`] and [`Design::fit`].
pub fn fit(
    spec: &ModelSpec,
    partition: &Partition,
    weights: &[f64],
    irls: &IrlsConfig,
) -> Result<BootstrapReplicate> {
    Design::new(spec, partition)?.fit(weights, irls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::INTERCEPT;
    use approx::assert_abs_diff_eq;

    fn partition() -> Partition {
        Partition::new([
            ("x", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            ("y", vec![2.1, 3.9, 6.2, 7.8, 10.1]),
            ("hit", vec![0.0, 1.0, 0.0, 1.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn continuous_fit_carries_dispersion() {
        let rep = fit(&ModelSpec::linear("y", ["x"]), &partition(), &[1.0; 5], &IrlsConfig::default()).unwrap();
        assert_eq!(rep.names(), &[INTERCEPT.to_string(), "x".to_string()]);
        assert_abs_diff_eq!(rep.coefficient("x").unwrap(), 1.99, epsilon = 1e-10);
        assert_abs_diff_eq!(rep.dispersion().unwrap(), (0.107_f64 / 3.0).sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn binary_fit_has_no_dispersion() {
        let rep = fit(&ModelSpec::logistic("hit", ["x"]), &partition(), &[1.0; 5], &IrlsConfig::default()).unwrap();
        assert!(rep.dispersion().is_none());
        assert_eq!(rep.coefficients().len(), 2);
    }

    #[test]
    fn wrong_weight_length_is_invalid() {
        for spec in [ModelSpec::linear("y", ["x"]), ModelSpec::logistic("hit", ["x"])] {
            let design = Design::new(&spec, &partition()).unwrap();
            let err = design.fit(&[1.0; 4], &IrlsConfig::default()).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "{spec}: {err}");
        }
    }

    #[test]
    fn model_without_coefficients_is_invalid() {
        let spec = ModelSpec::linear("y", Vec::<String>::new()).without_intercept();
        assert!(matches!(Design::new(&spec, &partition()), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn nan_response_is_rejected() {
        let data = partition().with_column("y_nan", vec![2.1, f64::NAN, 6.2, 7.8, 10.1]).unwrap();
        let err = fit(&ModelSpec::linear("y_nan", ["x"]), &data, &[1.0; 5], &IrlsConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("`y_nan`"), "{err}");
    }

    #[test]
    fn missing_predictor_is_schema_mismatch() {
        let err = fit(&ModelSpec::linear("y", ["z"]), &partition(), &[1.0; 5], &IrlsConfig::default()).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn replicate_rejects_misaligned_values() {
        let names: Arc<[String]> = vec!["a".to_string()].into();
        assert!(BootstrapReplicate::new(names, vec![1.0, 2.0], None).is_err());
    }
}
