use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use super::Partition;
use crate::error::{Error, Result};

impl Partition {
    /// Read a partition from a CSV file whose header names the columns.
    ///
    /// Every cell must parse as a number; surrounding whitespace is ignored.
    ///
    /// # Errors
    /// [`Error::Io`]/[`Error::Csv`] on read failures, [`Error::Parse`] on a
    /// non-numeric cell and [`Error::EmptyFile`] when there are no records.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let names: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

        for record in rdr.records() {
            let record = record?;
            for ((name, column), cell) in names.iter().zip(columns.iter_mut()).zip(record.iter()) {
                let value = cell.parse::<f64>().map_err(|_| Error::Parse {
                    column: name.clone(),
                    value: cell.to_owned(),
                })?;
                column.push(value);
            }
        }

        if columns.first().is_none_or(Vec::is_empty) {
            return Err(Error::EmptyFile);
        }

        let partition = Partition::new(names.into_iter().zip(columns))?;
        debug!(path = %path.display(), rows = partition.rows(), "read partition");
        Ok(partition)
    }
}

/// Read one partition per file, in the order given.
///
/// # Errors
/// The first failure from [`Partition::read`].
pub fn read_partitions<I, P>(paths: I) -> Result<Vec<Partition>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths.into_iter().map(Partition::read).collect()
}
