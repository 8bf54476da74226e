//! B replicate fits of one partition.

use rand::Rng;
use tracing::debug;

use crate::error::{Error, Result};
use crate::fit::{BootstrapReplicate, Design, IrlsConfig};
use crate::model::ModelSpec;
use crate::resample::Multinomial;
use crate::sample::Partition;
use crate::Re;

/// The B bootstrap replicates of one partition.
///
/// All replicates share one coefficient-name set.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsampleEstimate {
    replicates: Vec<BootstrapReplicate>,
}

impl SubsampleEstimate {
    /// Wrap replicates.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when `replicates` is empty,
    /// [`Error::InconsistentTerms`] when their coefficient names differ.
    pub fn new(replicates: Vec<BootstrapReplicate>) -> Result<Self> {
        let Some(first) = replicates.first() else {
            return Err(Error::InvalidArgument("a subsample estimate needs at least one replicate".into()));
        };
        if let Some(bad) = replicates.iter().find(|r| !r.shares_names_with(first)) {
            return Err(Error::InconsistentTerms {
                expected: first.names().to_vec(),
                found: bad.names().to_vec(),
            });
        }
        Ok(Self { replicates })
    }

    /// The replicates, in draw order.
    pub fn replicates(&self) -> &[BootstrapReplicate] {
        &self.replicates
    }

    /// B.
    pub fn len(&self) -> usize {
        self.replicates.len()
    }

    /// Always false for a constructed estimate.
    pub fn is_empty(&self) -> bool {
        self.replicates.is_empty()
    }

    /// Coefficient names shared by the replicates.
    pub fn names(&self) -> &[String] {
        match self.replicates.first() {
            Some(first) => first.names(),
            None => &[],
        }
    }

    /// Coefficient vectors, one per replicate.
    pub fn coefficient_rows(&self) -> Vec<&[f64]> {
        self.replicates.iter().map(BootstrapReplicate::coefficients).collect()
    }
}

/// Fit `replicates` multinomially reweighted copies of `partition`.
///
/// Each replicate draws a fresh weight vector from `rng` simulating a
/// bootstrap sample of `n_true` rows, so the draws are independent. The
/// first failing fit aborts the whole partition.
///
/// # Errors
/// [`Error::InvalidArgument`] when `replicates` is zero or the partition is
/// empty, plus any fitter error.
pub fn estimate<R: Rng + Clone>(
    spec: &ModelSpec,
    partition: &Partition,
    n_true: usize,
    replicates: usize,
    rng: R,
    irls: &IrlsConfig,
) -> Result<SubsampleEstimate> {
    if replicates == 0 {
        return Err(Error::InvalidArgument("number of replicates must be positive".into()));
    }
    let design = Design::new(spec, partition)?;
    debug!(n_sub = design.rows(), n_true, replicates, "estimating subsample");

    let fits = Multinomial::new(rng, n_true)
        .re(partition)
        .take(replicates)
        .map(|counts| {
            let weights: Vec<f64> = counts.into_iter().map(|c| c as f64).collect();
            design.fit(&weights, irls)
        })
        .collect::<Result<Vec<_>>>()?;

    SubsampleEstimate::new(fits)
}
