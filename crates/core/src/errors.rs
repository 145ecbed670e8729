//! Error types for the core inference pipeline.

use thiserror::Error;

/// Validation and inference failures surfaced to callers.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A record omitted one or more required feature names.
    #[error("Missing fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// A table omitted one or more required columns.
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A value could not be read as a number.
    #[error("invalid value {value:?} for {field} at row {row}")]
    InvalidValue {
        row: usize,
        field: String,
        value: String,
    },
}

/// Artifact loading failures.
///
/// These are fatal at startup: the process cannot serve predictions
/// without a usable scaler and classifier.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// The artifact file could not be read.
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The artifact file is not a valid document.
    #[error("malformed artifact {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The classifier was produced for a different artifact format.
    #[error("unsupported artifact version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// The artifact disagrees with the feature schema or is structurally
    /// broken.
    #[error("artifact incompatible with feature schema: {0}")]
    Incompatible(String),
}

/// Result type for core operations.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
