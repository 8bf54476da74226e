mod read;

pub use read::read_partitions;

use rand::Rng;

use crate::error::{Error, Result};

/// A column-oriented table of numeric observations.
///
/// A `Partition` is one subsample of the full dataset handed to the fitter,
/// and the same type carries the new rows passed to prediction. Columns are
/// kept in insertion order and all share one row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    rows: usize,
}

impl Partition {
    /// Build a partition from `(name, values)` pairs.
    ///
    /// # Errors
    /// [`Error::SchemaMismatch`] when columns differ in length or a name repeats.
    pub fn new<S, I>(columns: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<f64>)>,
    {
        let mut partition = Self::default();
        for (name, values) in columns {
            partition = partition.with_column(name, values)?;
        }
        Ok(partition)
    }

    /// Append a column.
    ///
    /// # Errors
    /// [`Error::SchemaMismatch`] when the length differs from existing columns or the name repeats.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(Error::SchemaMismatch(format!("duplicate column `{name}`")));
        }
        if !self.columns.is_empty() && values.len() != self.rows {
            return Err(Error::SchemaMismatch(format!(
                "column `{name}` has {} rows, expected {}",
                values.len(),
                self.rows
            )));
        }
        self.rows = values.len();
        self.names.push(name);
        self.columns.push(values);
        Ok(self)
    }

    /// Number of observations, `n_sub` when the table is a partition.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Check if the table contains no observations
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|idx| self.columns.get(idx))
            .map(Vec::as_slice)
    }

    /// Look up a column by name, failing with [`Error::SchemaMismatch`] when absent.
    ///
    /// # Errors
    /// [`Error::SchemaMismatch`] when no column is called `name`.
    pub fn require(&self, name: &str) -> Result<&[f64]> {
        self.column(name).ok_or_else(|| Error::missing_column(name))
    }

    /// Randomly assign rows to `m` partitions, each row independently and uniformly.
    ///
    /// Groups that end up with no rows are dropped, so fewer than `m`
    /// partitions may come back for tiny tables.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when `m` is zero or the table is empty.
    pub fn split<R: Rng + ?Sized>(&self, m: usize, rng: &mut R) -> Result<Vec<Partition>> {
        if m == 0 {
            return Err(Error::InvalidArgument("cannot split into 0 partitions".into()));
        }
        if self.is_empty() {
            return Err(Error::InvalidArgument("cannot split an empty table".into()));
        }

        let assignment: Vec<usize> = (0..self.rows).map(|_| rng.gen_range(0..m)).collect();

        let parts = (0..m)
            .map(|group| {
                let columns = self.names.iter().cloned().zip(self.columns.iter().map(|col| {
                    col.iter()
                        .zip(&assignment)
                        .filter(|&(_, g)| *g == group)
                        .map(|(v, _)| *v)
                        .collect::<Vec<f64>>()
                }));
                Partition::new(columns)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(parts.into_iter().filter(|p| !p.is_empty()).collect())
    }
}
