//! Running the subsample estimator over every partition.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{Span, debug, field, instrument};

use crate::config::BlbConfig;
use crate::error::{Error, Result};
use crate::estimate::estimate;
use crate::fitted::FittedModel;
use crate::model::ModelSpec;
use crate::sample::Partition;

/// Where the per-partition work runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Executor {
    /// One partition after another on the calling thread.
    #[default]
    Sequential,
    /// A dedicated rayon pool; `workers == 0` lets rayon choose.
    Parallel {
        /// Pool size.
        workers: usize,
    },
}

impl Executor {
    /// Apply `f` to every item, returning results in item order.
    ///
    /// `f` receives the item's index. When several items fail, the error of
    /// the lowest index is returned regardless of completion order.
    ///
    /// # Errors
    /// The first error in item order, or [`Error::Execution`] when the
    /// worker pool cannot be built.
    pub fn map<T, U, F>(&self, items: &[T], f: F) -> Result<Vec<U>>
    where
        T: Sync,
        U: Send,
        F: Fn(usize, &T) -> Result<U> + Sync,
    {
        match *self {
            Self::Sequential => sequential(items, &f),
            Self::Parallel { workers } => parallel(items, workers, &f),
        }
    }
}

fn sequential<T, U, F>(items: &[T], f: &F) -> Result<Vec<U>>
where
    F: Fn(usize, &T) -> Result<U>,
{
    items.iter().enumerate().map(|(i, item)| f(i, item)).collect()
}

#[cfg(feature = "rayon")]
fn parallel<T, U, F>(items: &[T], workers: usize, f: &F) -> Result<Vec<U>>
where
    T: Sync,
    U: Send,
    F: Fn(usize, &T) -> Result<U> + Sync,
{
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| Error::Execution(e.to_string()))?;
    debug!(workers = pool.current_num_threads(), "parallel executor");

    let results: Vec<Result<U>> =
        pool.install(|| items.par_iter().enumerate().map(|(i, item)| f(i, item)).collect());
    results.into_iter().collect()
}

#[cfg(not(feature = "rayon"))]
fn parallel<T, U, F>(items: &[T], workers: usize, f: &F) -> Result<Vec<U>>
where
    F: Fn(usize, &T) -> Result<U>,
{
    tracing::warn!(workers, "built without the `rayon` feature, running sequentially");
    sequential(items, f)
}

/// One random stream per partition.
///
/// Stream `i` is the seeded base generator advanced by `i` jumps of 2^128
/// steps, so streams never overlap and do not depend on the executor.
pub(crate) fn partition_streams(seed: u64, count: usize) -> Vec<Xoshiro256PlusPlus> {
    let mut base = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut streams = Vec::with_capacity(count);
    for _ in 0..count {
        streams.push(base.clone());
        base.jump();
    }
    streams
}

/// Fit `spec` by bag of little bootstraps over `partitions`.
///
/// # Errors
/// [`Error::InvalidArgument`] for an empty partition list or a bad config;
/// any estimator error, tagged with the partition it came from.
#[instrument(skip_all, fields(
    partitions = partitions.len(),
    replicates = config.replicates,
    n_true = field::Empty,
))]
pub fn fit_model(spec: &ModelSpec, partitions: &[Partition], config: &BlbConfig) -> Result<FittedModel> {
    config.validate()?;
    if partitions.is_empty() {
        return Err(Error::InvalidArgument("at least one partition is required".into()));
    }

    let n_true = config
        .n_true
        .unwrap_or_else(|| partitions.iter().map(Partition::rows).sum());
    if n_true == 0 {
        return Err(Error::InvalidArgument("all partitions are empty".into()));
    }
    Span::current().record("n_true", n_true);

    let seed = config.seed.unwrap_or_else(rand::random);
    let streams = partition_streams(seed, partitions.len());
    debug!(executor = ?config.executor, seed, "fitting {}", spec);

    let estimates = config.executor.map(partitions, |i, partition| {
        let result = estimate(spec, partition, n_true, config.replicates, streams[i].clone(), &config.irls)
            .map_err(|e| e.at_partition(i));
        debug!(partition = i, ok = result.is_ok(), "partition finished");
        result
    })?;

    FittedModel::new(spec.clone(), estimates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::IrlsConfig;
    use rand::Rng;

    fn partitions() -> Vec<Partition> {
        (0..3u32)
            .map(|p| {
                let x: Vec<f64> = (0..30).map(|i| f64::from(i + p) / 3.0).collect();
                let y: Vec<f64> = x.iter().map(|v| 0.5 + 1.5 * v + (v * 7.0 + f64::from(p)).sin()).collect();
                Partition::new([("x", x), ("y", y)]).unwrap()
            })
            .collect()
    }

    #[test]
    fn map_preserves_order() {
        let items: Vec<u32> = (0..50).collect();
        for executor in [Executor::Sequential, Executor::Parallel { workers: 3 }] {
            let out = executor.map(&items, |i, v| Ok(i as u32 * 10 + v)).unwrap();
            assert_eq!(out, (0..50).map(|v| v * 11).collect::<Vec<_>>());
        }
    }

    #[test]
    fn map_reports_lowest_failing_index() {
        let items: Vec<usize> = (0..20).collect();
        for executor in [Executor::Sequential, Executor::Parallel { workers: 4 }] {
            let err = executor
                .map(&items, |i, _| {
                    if i % 7 == 5 { Err(Error::singular("boom").at_partition(i)) } else { Ok(i) }
                })
                .unwrap_err();
            assert!(matches!(err, Error::SingularFit { partition: Some(5), .. }));
        }
    }

    #[test]
    fn streams_differ_and_are_reproducible() {
        let a = partition_streams(11, 3);
        let b = partition_streams(11, 3);
        let draw = |s: &Xoshiro256PlusPlus| s.clone().gen_range(0..u64::MAX);
        assert_eq!(a.iter().map(draw).collect::<Vec<_>>(), b.iter().map(draw).collect::<Vec<_>>());
        assert_ne!(draw(&a[0]), draw(&a[1]));
        assert_ne!(draw(&a[1]), draw(&a[2]));
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let spec = ModelSpec::linear("y", ["x"]);
        let base = BlbConfig::new().with_replicates(50).with_seed(3);
        let seq = fit_model(&spec, &partitions(), &base).unwrap();
        let par = fit_model(&spec, &partitions(), &base.clone().with_executor(Executor::Parallel { workers: 2 })).unwrap();
        assert_eq!(seq.estimates(), par.estimates());
    }

    #[test]
    fn failing_partition_is_identified() {
        let mut parts = partitions();
        parts[1] = Partition::new([("x", vec![2.0; 10]), ("y", (0..10).map(f64::from).collect())]).unwrap();
        let config = BlbConfig::new().with_replicates(5).with_seed(1);
        let err = fit_model(&ModelSpec::linear("y", ["x"]), &parts, &config).unwrap_err();
        assert!(matches!(err, Error::SingularFit { partition: Some(1), .. }), "{err}");
    }

    #[test]
    fn non_convergence_is_tagged_with_its_partition() {
        // y = 0.5 everywhere starts IRLS at its fixed point, so one step suffices
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let settled = Partition::new([("x", x.clone()), ("hit", vec![0.5; 20])]).unwrap();
        let mixed = Partition::new([
            ("x", x.clone()),
            ("hit", x.iter().map(|v| f64::from(u8::from((v * 1.3).sin() > 0.0))).collect()),
        ])
        .unwrap();
        let irls = IrlsConfig { max_iterations: 1, ..IrlsConfig::default() };
        let config = BlbConfig::new().with_replicates(4).with_seed(6).with_irls(irls);
        let spec = ModelSpec::logistic("hit", ["x"]);

        let ok = fit_model(&spec, &[settled.clone()], &config).unwrap();
        assert_eq!(ok.estimates()[0].len(), 4);

        for executor in [Executor::Sequential, Executor::Parallel { workers: 2 }] {
            let parts = [settled.clone(), mixed.clone(), mixed.clone()];
            let err = fit_model(&spec, &parts, &config.clone().with_executor(executor)).unwrap_err();
            assert!(matches!(err, Error::NonConvergence { partition: Some(1), iterations: 1 }), "{err}");
        }
    }

    #[test]
    fn no_partitions_is_invalid() {
        let err = fit_model(&ModelSpec::linear("y", ["x"]), &[], &BlbConfig::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn one_estimate_per_partition() {
        let config = BlbConfig::new().with_replicates(20).with_seed(9);
        let model = fit_model(&ModelSpec::linear("y", ["x"]), &partitions(), &config).unwrap();
        assert_eq!(model.estimates().len(), 3);
        assert!(model.estimates().iter().all(|e| e.len() == 20));
    }
}
