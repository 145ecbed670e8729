//! Bulk CSV prediction: ingest, validate, predict, augment, persist.

use std::sync::Arc;

use edutrack_core::{engine, ArtifactBundle, FeatureTable};
use tracing::info;

use crate::errors::JobError;
use crate::store::JobStore;

/// Column appended to the uploaded table.
pub const PREDICTION_COLUMN: &str = "Predicted_GradeClass";

/// Outcome of a successful bulk prediction.
#[derive(Debug, Clone)]
pub struct BulkOutcome {
    /// Public name of the persisted output file.
    pub output_name: String,
    /// Number of predicted rows.
    pub row_count: usize,
}

/// Orchestrates the bulk workflow over the shared bundle and job-file
/// store.
#[derive(Debug)]
pub struct BulkJobRunner {
    bundle: Arc<ArtifactBundle>,
    store: JobStore,
}

impl BulkJobRunner {
    pub fn new(bundle: Arc<ArtifactBundle>, store: JobStore) -> Self {
        Self { bundle, store }
    }

    /// The underlying job-file store (used by the download path).
    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Run one bulk request to completion or first failure.
    ///
    /// `filename` is the client-supplied upload name, `bytes` the upload
    /// body. Nothing reaches the output store unless every gate passes.
    pub async fn run(
        &self,
        filename: Option<&str>,
        bytes: &[u8],
    ) -> Result<BulkOutcome, JobError> {
        let filename = filename.ok_or(JobError::NoFile)?;
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(JobError::NotCsv);
        }

        self.store.sweep_expired().await;

        let id = self.store.new_job();
        self.store.save_upload(&id, bytes).await?;

        let table = parse_table(bytes)?;
        let rows = table.project()?;
        let predictions = engine::predict_batch(&self.bundle, &rows);

        let output = render_augmented(&table, &predictions)?;
        let output_name = self.store.save_output(&id, &output).await?;

        info!(
            job = id.as_str(),
            rows = predictions.len(),
            "bulk prediction complete"
        );

        Ok(BulkOutcome {
            output_name,
            row_count: predictions.len(),
        })
    }
}

/// Parse the upload into a validated feature table.
fn parse_table(bytes: &[u8]) -> Result<FeatureTable, JobError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(FeatureTable::new(headers, rows)?)
}

/// Append the prediction column, preserving original columns and row order.
fn render_augmented(table: &FeatureTable, predictions: &[i64]) -> Result<Vec<u8>, JobError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = table.headers().iter().map(String::as_str).collect();
    header.push(PREDICTION_COLUMN);
    writer.write_record(&header)?;

    for (row, prediction) in table.rows().iter().zip(predictions.iter()) {
        let mut record = row.clone();
        record.push(prediction.to_string());
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|err| JobError::Io(err.into_error()))
}
