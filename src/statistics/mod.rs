//! Statistics over replicate values and the BLB reductions built from them.

mod cdf;
mod ci;
mod mean;
mod quantile;
pub mod reduce;

pub use cdf::{CDF, EmpiricalCDF};
pub use ci::Interval;
pub use mean::Mean;
pub use quantile::{Quantile, QuantileInterval};
pub use reduce::{reduce_partitions, reduce_replicates, reduce_scalars};

/// A statistic computed from data `D`, producing `T`.
pub trait Statistic<D: ?Sized, T> {
    /// Evaluate the statistic.
    fn compute(&self, data: &D) -> T;
}

// ===== 2-tuple =====
impl<D, T1, T2, S1, S2> Statistic<D, (T1, T2)> for (S1, S2)
where
    D: ?Sized,
    S1: Statistic<D, T1>,
    S2: Statistic<D, T2>,
{
    #[inline]
    fn compute(&self, data: &D) -> (T1, T2) {
        (self.0.compute(data), self.1.compute(data))
    }
}
