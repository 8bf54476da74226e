//! Bag of little bootstraps (BLB) for linear and logistic regression.
//!
//! The data arrive pre-split into partitions. Each partition is refitted B
//! times under multinomial weights that simulate a bootstrap sample of the
//! full data size, so a partition of `n_sub` rows stands in for `n_true`.
//! Per-partition summaries (means, percentile bounds) are then averaged
//! across partitions.
//!
//! ```no_run
//! use blb::{BlbConfig, Executor, ModelSpec, Partition, read_partitions};
//!
//! # fn main() -> blb::Result<()> {
//! let partitions: Vec<Partition> = read_partitions(["a.csv", "b.csv", "c.csv"])?;
//! let model = BlbConfig::new()
//!     .with_replicates(2000)
//!     .with_seed(7)
//!     .with_executor(Executor::Parallel { workers: 3 })
//!     .fit(&ModelSpec::linear("y", ["x"]), &partitions)?;
//!
//! let slope = model.confidence_interval("x", 0.95)?;
//! println!("{model}\nslope {slope}");
//! # Ok(())
//! # }
//! ```

mod config;
mod display;
mod error;
mod estimate;
mod execution;
pub mod fit;
mod fitted;
mod model;
mod resample;
mod sample;
mod statistics;

pub use crate::config::BlbConfig;
pub use crate::error::{Error, Result};
pub use crate::estimate::{SubsampleEstimate, estimate};
pub use crate::execution::{Executor, fit_model};
pub use crate::fit::{BootstrapReplicate, Design, IrlsConfig};
pub use crate::fitted::{Coefficients, FittedModel};
pub use crate::model::{Family, INTERCEPT, ModelSpec};
pub use crate::resample::*;
pub use crate::sample::{Partition, read_partitions};
pub use crate::statistics::*;
pub use rand;
