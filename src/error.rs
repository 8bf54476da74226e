//! Error types for bag-of-little-bootstraps fitting.

use thiserror::Error;

/// Everything that can abort loading, fitting or querying a model.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed parameter: replicate count, subsample size, level, response values.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The weighted design matrix does not determine the coefficients.
    #[error("Singular fit{}: {reason}", fmt_partition(.partition))]
    SingularFit {
        /// Partition whose replicate failed, once known.
        partition: Option<usize>,
        /// What made the fit singular.
        reason: String,
    },

    /// Logistic IRLS ran out of iterations.
    #[error("IRLS did not converge{} after {iterations} iterations", fmt_partition(.partition))]
    NonConvergence {
        /// Partition whose replicate failed, once known.
        partition: Option<usize>,
        /// Iterations spent before giving up.
        iterations: usize,
    },

    /// A table lacks the columns the model needs, or its columns are ragged.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A query named a coefficient the model does not have.
    #[error("Unknown term: `{0}`")]
    UnknownTerm(String),

    /// Replicates disagree about the coefficient names.
    #[error("Inconsistent terms: expected {expected:?}, found {found:?}")]
    InconsistentTerms {
        /// Names carried by the first replicate.
        expected: Vec<String>,
        /// Names carried by the offending replicate.
        found: Vec<String>,
    },

    /// I/O failure while reading a partition.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// A CSV cell is not a number.
    #[error("Cannot parse `{value}` in column `{column}` as a number")]
    Parse {
        /// Column header.
        column: String,
        /// Offending cell.
        value: String,
    },

    /// The CSV file holds a header but no records.
    #[error("CSV file contains no data records")]
    EmptyFile,

    /// The worker pool could not be started.
    #[error("Execution error: {0}")]
    Execution(String),
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

fn fmt_partition(partition: &Option<usize>) -> String {
    partition.map_or_else(String::new, |idx| format!(" in partition {idx}"))
}

impl Error {
    /// Attach the index of the partition that produced this error.
    ///
    /// Fit failures keep the first partition they were tagged with; argument
    /// and schema messages are prefixed; anything else passes through.
    #[must_use]
    pub fn at_partition(self, index: usize) -> Self {
        match self {
            Self::SingularFit { partition: None, reason } => Self::SingularFit {
                partition: Some(index),
                reason,
            },
            Self::NonConvergence { partition: None, iterations } => Self::NonConvergence {
                partition: Some(index),
                iterations,
            },
            Self::InvalidArgument(msg) => {
                Self::InvalidArgument(format!("partition {index}: {msg}"))
            }
            Self::SchemaMismatch(msg) => Self::SchemaMismatch(format!("partition {index}: {msg}")),
            other => other,
        }
    }

    pub(crate) fn singular(reason: impl Into<String>) -> Self {
        Self::SingularFit {
            partition: None,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_level(level: f64) -> Self {
        Self::InvalidArgument(format!("confidence level {level} must lie strictly between 0 and 1"))
    }

    pub(crate) fn missing_column(name: &str) -> Self {
        Self::SchemaMismatch(format!("column `{name}` not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_partition_once_known() {
        let err = Error::singular("predictor `x` is constant");
        assert_eq!(err.to_string(), "Singular fit: predictor `x` is constant");

        let err = err.at_partition(2);
        assert_eq!(
            err.to_string(),
            "Singular fit in partition 2: predictor `x` is constant"
        );
    }

    #[test]
    fn at_partition_keeps_first_index() {
        let err = Error::NonConvergence { partition: Some(0), iterations: 25 }.at_partition(3);
        assert!(matches!(err, Error::NonConvergence { partition: Some(0), iterations: 25 }));
    }

    #[test]
    fn query_errors_pass_through() {
        let err = Error::UnknownTerm("z".into()).at_partition(1);
        assert_eq!(err.to_string(), "Unknown term: `z`");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("missing.csv"));
    }
}
