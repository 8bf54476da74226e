use num_traits::Float;

use super::Statistic;

/// Empirical Cumulative Distribution Function (ECDF) of a set of replicate values.
///
/// Stores the values sorted ascending; quantile estimators read the order
/// statistics straight from [`EmpiricalCDF::points`].
///
/// # Float Handling Policy
/// NaN is kept and sorts last rather than being dropped: a replicate that
/// produced NaN shows up in the bounds instead of silently shrinking the
/// replicate count.
#[derive(Debug, Clone)]
pub struct EmpiricalCDF<T> {
    sorted: Vec<T>,
}

impl<T: Float> EmpiricalCDF<T> {
    /// Creates the ECDF of `data`.
    pub fn from_float_slice(data: &[T]) -> Self {
        let mut sorted = data.to_vec();
        sorted.sort_by(|a, b| {
            a.partial_cmp(b)
                .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
        });
        Self { sorted }
    }

    /// Number of points.
    #[inline]
    pub fn n(&self) -> usize {
        self.sorted.len()
    }

    /// Sorted points.
    #[inline]
    pub fn points(&self) -> &[T] {
        &self.sorted
    }

    /// Whether the ECDF holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Evaluates Fₙ(x), the share of points `<= x`.
    pub fn eval(&self, x: T) -> f64 {
        if self.sorted.is_empty() || x.is_nan() {
            return f64::NAN;
        }
        let idx = self.sorted.partition_point(|v| *v <= x);
        idx as f64 / self.sorted.len() as f64
    }
}

impl<T> AsRef<[T]> for EmpiricalCDF<T> {
    fn as_ref(&self) -> &[T] {
        &self.sorted
    }
}

/// Builds an [`EmpiricalCDF`] from raw values.
#[derive(Debug, Clone, Copy, Default)]
pub struct CDF;

impl<D, T> Statistic<D, EmpiricalCDF<T>> for CDF
where
    D: AsRef<[T]> + ?Sized,
    T: Float,
{
    #[inline]
    fn compute(&self, data: &D) -> EmpiricalCDF<T> {
        EmpiricalCDF::from_float_slice(data.as_ref())
    }
}
