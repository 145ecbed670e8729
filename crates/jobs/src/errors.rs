//! Failure exits for the bulk prediction workflow.

use edutrack_core::CoreError;
use thiserror::Error;

/// Errors raised by the bulk workflow. Each gate failure is terminal for
/// its request; there is no retry and no partial success.
#[derive(Error, Debug)]
pub enum JobError {
    /// The request carried no file part.
    #[error("No file provided")]
    NoFile,

    /// The uploaded filename does not end in `.csv`.
    #[error("Only CSV files are allowed")]
    NotCsv,

    /// The upload is not a well-formed delimited table.
    #[error("failed to parse CSV: {0}")]
    Parse(#[from] csv::Error),

    /// Schema or numeric validation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The requested output file does not exist.
    #[error("File not found")]
    NotFound,

    /// Underlying file-system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
