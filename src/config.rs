//! Fitting configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::execution::{Executor, fit_model};
use crate::fit::IrlsConfig;
use crate::fitted::FittedModel;
use crate::model::ModelSpec;
use crate::sample::Partition;

/// How a BLB fit is run.
///
/// ```text
/// BlbConfig::new()
///     .with_replicates(2000)
///     .with_seed(42)
///     .with_executor(Executor::Parallel { workers: 4 })
///     .fit(&spec, &partitions)?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlbConfig {
    /// Bootstrap replicates per partition (B).
    pub replicates: usize,
    /// Size of the simulated bootstrap samples; defaults to the total row count.
    pub n_true: Option<usize>,
    /// Seed for the per-partition random streams; drawn from entropy when unset.
    pub seed: Option<u64>,
    /// Sequential or parallel execution over partitions.
    pub executor: Executor,
    /// Logistic IRLS settings.
    pub irls: IrlsConfig,
}

impl Default for BlbConfig {
    fn default() -> Self {
        Self {
            replicates: 5000,
            n_true: None,
            seed: None,
            executor: Executor::default(),
            irls: IrlsConfig::default(),
        }
    }
}

impl BlbConfig {
    /// Defaults: B = 5000, sequential, unseeded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of bootstrap replicates per partition.
    #[must_use]
    pub fn with_replicates(mut self, replicates: usize) -> Self {
        self.replicates = replicates;
        self
    }

    /// Override the simulated bootstrap sample size.
    #[must_use]
    pub fn with_n_true(mut self, n_true: usize) -> Self {
        self.n_true = Some(n_true);
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Choose the executor.
    #[must_use]
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Replace the IRLS settings.
    #[must_use]
    pub fn with_irls(mut self, irls: IrlsConfig) -> Self {
        self.irls = irls;
        self
    }

    /// Check the settings before any work starts.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for zero replicates, a zero `n_true`, or an
    /// IRLS budget that cannot succeed.
    pub fn validate(&self) -> Result<()> {
        if self.replicates == 0 {
            return Err(Error::InvalidArgument("number of replicates must be positive".into()));
        }
        if self.n_true == Some(0) {
            return Err(Error::InvalidArgument("n_true must be positive".into()));
        }
        if self.irls.max_iterations == 0 || self.irls.tolerance.is_nan() || self.irls.tolerance <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "IRLS needs at least one iteration and a positive tolerance, got {:?}",
                self.irls
            )));
        }
        Ok(())
    }

    /// Shorthand for [`fit_model`].
    ///
    /// # Errors
    /// See [`fit_model`].
    pub fn fit(&self, spec: &ModelSpec, partitions: &[Partition]) -> Result<FittedModel> {
        fit_model(spec, partitions, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BlbConfig::new();
        assert_eq!(config.replicates, 5000);
        assert_eq!(config.executor, Executor::Sequential);
        assert_eq!(config.irls.max_iterations, 25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_replicates_rejected() {
        let err = BlbConfig::new().with_replicates(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn zero_n_true_rejected() {
        assert!(BlbConfig::new().with_n_true(0).validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: BlbConfig =
            serde_json::from_str(r#"{"replicates": 100, "executor": {"Parallel": {"workers": 2}}}"#).unwrap();
        assert_eq!(config.replicates, 100);
        assert_eq!(config.executor, Executor::Parallel { workers: 2 });
        assert_eq!(config.seed, None);
        assert_eq!(config.irls, IrlsConfig::default());
    }
}
