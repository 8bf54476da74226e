//! The two-level reduction behind every BLB aggregate.
//!
//! Each aggregate (coefficients, dispersion, linear predictors, their
//! bounds) is computed the same way: reduce the B replicate vectors of a
//! partition column by column with some statistic, then average the M
//! partition-level vectors column by column. Both steps are commutative, so
//! neither partition order nor replicate order changes the result.

use crate::error::{Error, Result};

use super::{Mean, Statistic};

/// Reduces `rows` column by column with `reduce`.
///
/// Every row must have the same length `k`; the output has length `k`, with
/// entry `j` equal to `reduce` applied to column `j`.
///
/// # Errors
/// [`Error::InvalidArgument`] when `rows` is empty or ragged.
pub fn reduce_replicates<R, O, F>(rows: &[R], mut reduce: F) -> Result<Vec<O>>
where
    R: AsRef<[f64]>,
    F: FnMut(&[f64]) -> O,
{
    let width = match rows.first() {
        Some(first) => first.as_ref().len(),
        None => return Err(Error::InvalidArgument("nothing to reduce".into())),
    };
    if let Some(bad) = rows.iter().find(|r| r.as_ref().len() != width) {
        return Err(Error::InvalidArgument(format!(
            "ragged replicate vectors: expected length {width}, got {}",
            bad.as_ref().len()
        )));
    }

    let mut column = Vec::with_capacity(rows.len());
    let mut out = Vec::with_capacity(width);
    for j in 0..width {
        column.clear();
        column.extend(rows.iter().filter_map(|r| r.as_ref().get(j).copied()));
        out.push(reduce(&column));
    }
    Ok(out)
}

/// Averages partition-level vectors column by column (mean of means).
///
/// # Errors
/// [`Error::InvalidArgument`] when `partitions` is empty or ragged.
pub fn reduce_partitions<R: AsRef<[f64]>>(partitions: &[R]) -> Result<Vec<f64>> {
    reduce_replicates(partitions, |column| Mean.compute(column))
}

/// Averages one scalar per partition.
///
/// # Errors
/// [`Error::InvalidArgument`] when `values` is empty.
pub fn reduce_scalars(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(Error::InvalidArgument("nothing to reduce".into()));
    }
    Ok(Mean.compute(values))
}
