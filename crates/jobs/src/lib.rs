//! Bulk CSV prediction for the EduTrack prediction service.
//!
//! Orchestrates the upload-to-download workflow: format gate, input
//! persistence, CSV parsing, schema validation, batch inference, result
//! augmentation and output persistence. Every request owns its files.

pub mod errors;
pub mod runner;
pub mod store;

pub use errors::JobError;
pub use runner::{BulkJobRunner, BulkOutcome, PREDICTION_COLUMN};
pub use store::{JobId, JobStore, DEFAULT_RETENTION};
