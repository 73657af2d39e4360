//! ### Error
//! Failures the data layer reports back to the dashboard host.

use std::path::PathBuf;
use thiserror::Error;

use crate::record::DatasetKind;

#[derive(Error, Debug)]
pub enum DataError {
    /// The file is missing or unreadable. Halts the affected view.
    #[error("data source unavailable: {}: {source}", path.display())]
    DataSourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no 'year', 'date' or 'period' column found in {dataset} data")]
    MissingTemporalColumn { dataset: DatasetKind },

    #[error("no column matching {expected:?} found in {dataset} data")]
    MissingColumn {
        dataset: DatasetKind,
        expected: &'static [&'static str],
    },

    /// A single row failed type coercion. The loader counts and skips these
    /// rather than returning them.
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("{operation} needs full dates, but the dataset only carries years")]
    DateRequired { operation: &'static str },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;
