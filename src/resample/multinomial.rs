use rand::Rng;
use rand_distr::{Binomial, Distribution};

use super::Re;
use crate::error::{Error, Result};
use crate::sample::Partition;

/// Draw one Multinomial(`n_true`, uniform over `n_sub` categories) weight vector.
///
/// Row `i` of a subsample gets weight `wᵢ`, the number of times it would
/// appear in a bootstrap sample of size `n_true` drawn from the subsample.
/// The weights are non-negative and sum to exactly `n_true`.
///
/// The draw walks the categories with conditional binomials: category `i`
/// takes `Binomial(remaining, 1 / (n_sub - i))` and the last category
/// takes whatever remains. Cost is `O(n_sub)` binomial draws regardless of
/// `n_true`.
///
/// # Errors
/// [`Error::InvalidArgument`] when `n_sub == 0`.
pub fn draw_weights<R: Rng + ?Sized>(n_sub: usize, n_true: usize, rng: &mut R) -> Result<Vec<u64>> {
    let Some(last) = n_sub.checked_sub(1) else {
        return Err(Error::InvalidArgument("subsample size must be positive".into()));
    };

    let mut remaining = n_true as u64;
    let mut weights = Vec::with_capacity(n_sub);
    for i in 0..last {
        if remaining == 0 {
            weights.push(0);
            continue;
        }
        let p = 1.0 / (n_sub - i) as f64;
        let draw = Binomial::new(remaining, p)
            .map_err(|e| Error::InvalidArgument(format!("binomial({remaining}, {p}): {e}")))?
            .sample(rng);
        weights.push(draw);
        remaining -= draw;
    }
    weights.push(remaining);
    Ok(weights)
}

/// Multinomial reweighting resampler: the "little bootstrap" of BLB.
///
/// Instead of materialising an `n_true`-row resample of an `n_sub`-row
/// partition, each resample is described by how often every partition row
/// is repeated.
#[derive(Clone, Copy, Debug)]
pub struct Multinomial<R: Rng> {
    /// Random stream the weight vectors are drawn from.
    pub rng: R,
    /// Size of the bootstrap sample being simulated (the full dataset's row count).
    pub n_true: usize,
}

impl<R: Rng> Multinomial<R> {
    /// Resampler simulating bootstrap samples of size `n_true`.
    pub fn new(rng: R, n_true: usize) -> Self {
        Self { rng, n_true }
    }
}

impl<R: Rng + Clone> Re<Partition> for Multinomial<R> {
    type Item = Vec<u64>;

    fn re(&self, partition: &Partition) -> impl Iterator<Item = Self::Item> {
        MultinomialIter::new(partition.rows(), self.n_true, self.rng.clone())
    }
}

/// Unbounded stream of independent weight vectors; empty when `n_sub == 0`.
pub struct MultinomialIter<R: Rng> {
    n_sub: usize,
    n_true: usize,
    rng: R,
}

impl<R: Rng> MultinomialIter<R> {
    /// Stream of weight vectors drawn from `rng`.
    pub fn new(n_sub: usize, n_true: usize, rng: R) -> Self {
        Self { n_sub, n_true, rng }
    }
}

impl<R: Rng> Iterator for MultinomialIter<R> {
    type Item = Vec<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        draw_weights(self.n_sub, self.n_true, &mut self.rng).ok()
    }
}
