use num_traits::{Float, FromPrimitive};

use super::Statistic;

/// Arithmetic mean with **Kahan summation**.
///
/// Replicate counts in the thousands and partition counts in the tens are
/// summed here, and the compensated sum keeps the result insensitive to the
/// order of the values, which the across-partition reduction relies on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl<D, T> Statistic<D, T> for Mean
where
    D: AsRef<[T]> + ?Sized,
    T: Float + FromPrimitive,
{
    fn compute(&self, data: &D) -> T {
        let slice: &[T] = data.as_ref();

        let mut sum = T::zero();
        let mut c = T::zero();

        for &x in slice {
            let y = x - c;
            let t = sum + y;
            c = (t - sum) - y;
            sum = t;
        }

        // Empty input divides by zero and yields NaN
        T::from_usize(slice.len()).map_or_else(T::nan, |n| sum / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn empty_slice_returns_nan() {
        let mean: f64 = Mean.compute(&Vec::<f64>::new());
        assert!(mean.is_nan(), "Empty slice must return NaN (got: {mean})");
    }

    #[test]
    fn exact_integer_means() {
        let mean: f64 = Mean.compute(&[1.0_f64, 2.0, 3.0, 4.0, 5.0]);
        assert_abs_diff_eq!(mean, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn kahan_reduces_accumulation_error() {
        let n = 10_000;
        let data: Vec<f32> = vec![0.1_f32; n];
        let expected = 0.1_f32;

        let kahan_mean: f32 = Mean.compute(&data);
        let naive_mean: f32 = data.iter().sum::<f32>() / (n as f32);

        let kahan_error = (kahan_mean - expected).abs();
        let naive_error = (naive_mean - expected).abs();
        assert!(
            kahan_error < naive_error * 0.5,
            "Kahan error ({kahan_error:.2e}) should be <50% of naive error ({naive_error:.2e})"
        );
    }

    #[test]
    fn permutation_changes_nothing_visible() {
        let data: Vec<f64> = (0..500).map(|i| (f64::from(i) * 0.731).sin() * 1e3).collect();
        let mut reversed = data.clone();
        reversed.reverse();

        let forward: f64 = Mean.compute(&data);
        let backward: f64 = Mean.compute(&reversed);
        assert_abs_diff_eq!(forward, backward, epsilon = 1e-12);
    }
}
