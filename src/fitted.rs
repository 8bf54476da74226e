//! Queries over a fitted BLB model.

use nalgebra::DVector;
use statrs::function::logistic::logistic;

use crate::error::{Error, Result};
use crate::estimate::SubsampleEstimate;
use crate::fit::BootstrapReplicate;
use crate::model::{Family, INTERCEPT, ModelSpec};
use crate::sample::Partition;
use crate::statistics::{
    CDF, EmpiricalCDF, Interval, Mean, QuantileInterval, Statistic, reduce_partitions,
    reduce_replicates, reduce_scalars,
};

/// Aggregated coefficient estimates, in design-column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    names: Vec<String>,
    values: Vec<f64>,
}

impl Coefficients {
    /// Coefficient names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Estimates aligned with [`names`](Self::names).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Estimate for one term.
    pub fn get(&self, name: &str) -> Option<f64> {
        let idx = self.names.iter().position(|n| n == name)?;
        self.values.get(idx).copied()
    }

    /// `(name, estimate)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    /// Number of coefficients.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the model has no coefficients at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The result of a BLB fit: the model and one [`SubsampleEstimate`] per partition.
///
/// Every query reduces each partition's replicates to a partition-level
/// vector, then averages those vectors across partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    spec: ModelSpec,
    estimates: Vec<SubsampleEstimate>,
}

impl FittedModel {
    /// Assemble a fitted model.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for no estimates, [`Error::InconsistentTerms`]
    /// when an estimate's coefficient names differ from the model's.
    pub fn new(spec: ModelSpec, estimates: Vec<SubsampleEstimate>) -> Result<Self> {
        if estimates.is_empty() {
            return Err(Error::InvalidArgument("a fitted model needs at least one partition".into()));
        }
        let expected = spec.coefficient_names();
        if let Some(bad) = estimates.iter().find(|e| e.names() != expected.as_slice()) {
            return Err(Error::InconsistentTerms {
                expected,
                found: bad.names().to_vec(),
            });
        }
        Ok(Self { spec, estimates })
    }

    /// The model that was fitted.
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Partition-level estimates, in partition order.
    pub fn estimates(&self) -> &[SubsampleEstimate] {
        &self.estimates
    }

    /// Number of partitions, M.
    pub fn partitions(&self) -> usize {
        self.estimates.len()
    }

    /// Replicates per partition, B.
    pub fn replicates(&self) -> usize {
        self.estimates.first().map_or(0, SubsampleEstimate::len)
    }

    /// Coefficient names, intercept first when present.
    pub fn names(&self) -> &[String] {
        match self.estimates.first() {
            Some(first) => first.names(),
            None => &[],
        }
    }

    /// Mean of the per-partition mean coefficient vectors.
    ///
    /// # Errors
    /// Only if the estimates are internally inconsistent.
    pub fn coefficients(&self) -> Result<Coefficients> {
        let values = self.aggregate_means(|r| Ok(r.coefficients().to_vec()))?;
        Ok(Coefficients {
            names: self.names().to_vec(),
            values,
        })
    }

    /// Mean of the per-partition mean residual scale.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for the binary family, which has no dispersion.
    pub fn dispersion(&self) -> Result<f64> {
        self.require_dispersion()?;
        let partition_means = self
            .estimates
            .iter()
            .map(|est| {
                let sigmas = est
                    .replicates()
                    .iter()
                    .map(|r| r.dispersion().ok_or_else(missing_dispersion))
                    .collect::<Result<Vec<f64>>>()?;
                Ok(mean(&sigmas))
            })
            .collect::<Result<Vec<f64>>>()?;
        reduce_scalars(&partition_means)
    }

    /// Percentile interval for the residual scale.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for the binary family or a level outside `(0, 1)`.
    pub fn dispersion_interval(&self, level: f64) -> Result<Interval<f64>> {
        check_level(level)?;
        self.require_dispersion()?;
        let intervals = self.aggregate_intervals(level, dispersion_of)?;
        intervals
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidArgument("no dispersion to aggregate".into()))
    }

    /// Percentile interval for one coefficient.
    ///
    /// The estimate attached to the interval is the aggregated coefficient.
    ///
    /// # Errors
    /// [`Error::UnknownTerm`] when `term` is not a coefficient,
    /// [`Error::InvalidArgument`] for a level outside `(0, 1)`.
    pub fn confidence_interval(&self, term: &str, level: f64) -> Result<Interval<f64>> {
        let mut intervals = self.confidence_intervals(&[term], level)?;
        intervals
            .pop()
            .map(|(_, interval)| interval)
            .ok_or_else(|| Error::UnknownTerm(term.to_owned()))
    }

    /// Percentile intervals for several coefficients; an empty `terms`
    /// selects every coefficient except the intercept.
    ///
    /// # Errors
    /// As [`confidence_interval`](Self::confidence_interval); nothing is
    /// computed unless every term is known.
    pub fn confidence_intervals(&self, terms: &[&str], level: f64) -> Result<Vec<(String, Interval<f64>)>> {
        check_level(level)?;
        let names = self.names();
        let selected: Vec<usize> = if terms.is_empty() {
            (0..names.len()).filter(|&j| names[j] != INTERCEPT).collect()
        } else {
            terms
                .iter()
                .map(|t| {
                    names
                        .iter()
                        .position(|n| n == t)
                        .ok_or_else(|| Error::UnknownTerm((*t).to_owned()))
                })
                .collect::<Result<_>>()?
        };
        if selected.is_empty() {
            return Ok(Vec::new());
        }

        let intervals = self.aggregate_intervals(level, |r| {
            let coefficients = r.coefficients();
            Ok(selected.iter().filter_map(|&j| coefficients.get(j).copied()).collect())
        })?;
        Ok(selected
            .iter()
            .map(|&j| names[j].clone())
            .zip(intervals)
            .collect())
    }

    /// Point predictions for the rows of `data`.
    ///
    /// Continuous: the aggregated linear predictor. Binary: the logistic
    /// inverse link applied to the aggregated linear predictor.
    ///
    /// # Errors
    /// [`Error::SchemaMismatch`] when `data` lacks a predictor column.
    pub fn predict(&self, data: &Partition) -> Result<Vec<f64>> {
        let predictors = self.linear_predictors(data)?;
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let eta = self.aggregate_means(&predictors)?;
        Ok(match self.spec.family {
            Family::Continuous => eta,
            Family::Binary => eta.into_iter().map(logistic).collect(),
        })
    }

    /// Predictions with percentile intervals.
    ///
    /// For the binary family every replicate's linear predictor is mapped to
    /// a probability before aggregating, so all bounds lie in `[0, 1]`.
    ///
    /// # Errors
    /// [`Error::SchemaMismatch`] when `data` lacks a predictor column,
    /// [`Error::InvalidArgument`] for a level outside `(0, 1)`.
    pub fn predict_interval(&self, data: &Partition, level: f64) -> Result<Vec<Interval<f64>>> {
        check_level(level)?;
        let predictors = self.linear_predictors(data)?;
        if data.is_empty() {
            return Ok(Vec::new());
        }
        match self.spec.family {
            Family::Continuous => self.aggregate_intervals(level, &predictors),
            Family::Binary => self.aggregate_intervals(level, |r| {
                Ok(predictors(r)?.into_iter().map(logistic).collect())
            }),
        }
    }

    /// `η = Xβ` per replicate, with `X` resolved once against `data`.
    fn linear_predictors(
        &self,
        data: &Partition,
    ) -> Result<impl Fn(&BootstrapReplicate) -> Result<Vec<f64>>> {
        let x = self.spec.design(data)?;
        Ok(move |r: &BootstrapReplicate| {
            let beta = DVector::from_column_slice(r.coefficients());
            if beta.len() != x.ncols() {
                return Err(Error::InconsistentTerms {
                    expected: self.spec.coefficient_names(),
                    found: r.names().to_vec(),
                });
            }
            Ok((&x * beta).iter().copied().collect())
        })
    }

    fn require_dispersion(&self) -> Result<()> {
        match self.spec.family {
            Family::Continuous => Ok(()),
            Family::Binary => Err(Error::InvalidArgument(
                "dispersion is not defined for the logistic family".into(),
            )),
        }
    }

    /// Per-replicate vectors → per-partition means → mean across partitions.
    fn aggregate_means<F>(&self, per_replicate: F) -> Result<Vec<f64>>
    where
        F: Fn(&BootstrapReplicate) -> Result<Vec<f64>>,
    {
        let partition_means = self
            .estimates
            .iter()
            .map(|est| {
                let rows = replicate_rows(est, &per_replicate)?;
                reduce_replicates(&rows, mean)
            })
            .collect::<Result<Vec<_>>>()?;
        reduce_partitions(&partition_means)
    }

    /// As [`aggregate_means`](Self::aggregate_means), but each partition
    /// contributes `{mean, α/2 quantile, 1 − α/2 quantile}` per column.
    fn aggregate_intervals<F>(&self, level: f64, per_replicate: F) -> Result<Vec<Interval<f64>>>
    where
        F: Fn(&BootstrapReplicate) -> Result<Vec<f64>>,
    {
        let bounds = QuantileInterval::percentile(level);
        let partition_summaries = self
            .estimates
            .iter()
            .map(|est| {
                let rows = replicate_rows(est, &per_replicate)?;
                let summaries = reduce_replicates(&rows, |column| {
                    let ecdf: EmpiricalCDF<f64> = CDF.compute(column);
                    let (estimate, (lower, upper)): (f64, (f64, f64)) = (Mean, bounds).compute(&ecdf);
                    [estimate, lower, upper]
                })?;
                Ok(summaries.into_iter().flatten().collect::<Vec<f64>>())
            })
            .collect::<Result<Vec<_>>>()?;

        let averaged = reduce_partitions(&partition_summaries)?;
        Ok(averaged
            .chunks_exact(3)
            .map(|c| Interval::new(c[1], c[2]).estimate(c[0]).confidence(level))
            .collect())
    }
}

fn replicate_rows<F>(est: &SubsampleEstimate, per_replicate: &F) -> Result<Vec<Vec<f64>>>
where
    F: Fn(&BootstrapReplicate) -> Result<Vec<f64>>,
{
    est.replicates().iter().map(per_replicate).collect()
}

fn mean(values: &[f64]) -> f64 {
    Mean.compute(values)
}

fn missing_dispersion() -> Error {
    Error::InvalidArgument("replicate carries no dispersion".into())
}

fn dispersion_of(r: &BootstrapReplicate) -> Result<Vec<f64>> {
    r.dispersion().map(|sigma| vec![sigma]).ok_or_else(missing_dispersion)
}

fn check_level(level: f64) -> Result<()> {
    if level.is_nan() || level <= 0.0 || level >= 1.0 {
        return Err(Error::invalid_level(level));
    }
    Ok(())
}
