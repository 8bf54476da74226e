use num_traits::Float;

use super::Statistic;
use crate::EmpiricalCDF;

/// Sample quantile by linear interpolation between order statistics.
///
/// With sorted values x₍₀₎ ≤ … ≤ x₍ₙ₋₁₎ and `h = (n - 1)·p`:
/// ```text
/// Q(p) = x₍⌊h⌋₎ + (h - ⌊h⌋)·(x₍⌊h⌋+1₎ - x₍⌊h⌋₎)
/// ```
/// This is Hyndman & Fan's type 7 (R's `quantile()` default). `Q(p)` is
/// non-decreasing in `p`, so wider levels always give wider percentile
/// intervals.
#[derive(Debug, Clone, Copy)]
pub struct Quantile {
    p: f64,
}

impl Quantile {
    /// Creates a quantile estimator for probability `p ∈ [0, 1]`.
    #[inline]
    pub fn new(p: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&p), "Quantile p must be in [0,1]");
        Self { p }
    }

    /// Convenience constructor for median (p = 0.5).
    #[inline]
    pub fn median() -> Self {
        Self { p: 0.5 }
    }
}

#[inline]
fn interpolate<T: Float>(points: &[T], p: f64) -> T {
    let n = points.len();
    if n == 0 {
        return T::nan();
    }

    let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = (h.floor() as usize).min(n - 1);
    let hi = (lo + 1).min(n - 1);
    let frac = T::from(h - lo as f64).unwrap_or_else(T::zero);

    let (x_lo, x_hi) = match (points.get(lo), points.get(hi)) {
        (Some(&a), Some(&b)) => (a, b),
        _ => return T::nan(),
    };
    if frac.is_zero() {
        x_lo
    } else {
        x_lo + frac * (x_hi - x_lo)
    }
}

impl<T: Float> Statistic<EmpiricalCDF<T>, T> for Quantile {
    #[inline]
    fn compute(&self, ecdf: &EmpiricalCDF<T>) -> T {
        interpolate(ecdf.points(), self.p)
    }
}

/// Quantile pair `(Q(lower), Q(upper))`, the percentile interval of a bootstrap distribution.
#[derive(Debug, Clone, Copy)]
pub struct QuantileInterval {
    lower: f64,
    upper: f64,
}

impl QuantileInterval {
    /// Creates interval estimator for `[lower, upper]` probabilities.
    #[inline]
    pub fn new(lower: f64, upper: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&lower));
        debug_assert!((0.0..=1.0).contains(&upper));
        debug_assert!(lower <= upper);
        Self { lower, upper }
    }

    /// Two-sided percentile interval at `confidence`: probabilities `{α/2, 1 - α/2}`.
    #[inline]
    pub fn percentile(confidence: f64) -> Self {
        let alpha = 1.0 - confidence;
        Self::new(alpha / 2.0, 1.0 - alpha / 2.0)
    }
}

impl<T: Float> Statistic<EmpiricalCDF<T>, (T, T)> for QuantileInterval {
    #[inline]
    fn compute(&self, ecdf: &EmpiricalCDF<T>) -> (T, T) {
        let points = ecdf.points();
        (interpolate(points, self.lower), interpolate(points, self.upper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CDF;
    use approx::assert_abs_diff_eq;

    fn ecdf(values: &[f64]) -> EmpiricalCDF<f64> {
        CDF.compute(values)
    }

    #[test]
    fn matches_r_type7() {
        // quantile(c(1, 2, 3, 4, 10), c(0.025, 0.5, 0.975)) == 1.1, 3.0, 9.4
        let e = ecdf(&[10.0, 1.0, 3.0, 2.0, 4.0]);
        assert_abs_diff_eq!(Quantile::new(0.025).compute(&e), 1.1, epsilon = 1e-12);
        assert_abs_diff_eq!(Quantile::median().compute(&e), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(Quantile::new(0.975).compute(&e), 9.4, epsilon = 1e-12);
    }

    #[test]
    fn endpoints_are_min_and_max() {
        let e = ecdf(&[5.0, -2.0, 7.5]);
        assert_abs_diff_eq!(Quantile::new(0.0).compute(&e), -2.0);
        assert_abs_diff_eq!(Quantile::new(1.0).compute(&e), 7.5);
    }

    #[test]
    fn single_point_is_degenerate_interval() {
        let (lo, hi) = QuantileInterval::percentile(0.95).compute(&ecdf(&[4.2]));
        assert_abs_diff_eq!(lo, 4.2);
        assert_abs_diff_eq!(hi, 4.2);
    }

    #[test]
    fn narrower_level_nests_inside_wider() {
        let values: Vec<f64> = (0..101).map(|i| (f64::from(i) * 1.7).cos()).collect();
        let e = ecdf(&values);
        let (lo95, hi95) = QuantileInterval::percentile(0.95).compute(&e);
        let (lo50, hi50) = QuantileInterval::percentile(0.5).compute(&e);
        assert!(lo95 <= lo50 && lo50 <= hi50 && hi50 <= hi95);
    }

    #[test]
    fn empty_distribution_is_nan() {
        let e = ecdf(&[]);
        assert!(Quantile::median().compute(&e).is_nan());
    }
}
