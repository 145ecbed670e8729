//! Scale-then-classify inference.
//!
//! Pure functions over the shared read-only artifact bundle; the single
//! and batch paths share identical numeric semantics.

use crate::artifacts::ArtifactBundle;
use crate::schema::FeatureVector;

/// Predict the grade class for a single row.
pub fn predict_one(bundle: &ArtifactBundle, features: &FeatureVector) -> i64 {
    let scaled = bundle.scaler.transform(features);
    bundle.forest.classify(&scaled)
}

/// Predict grade classes for a batch of rows, one label per row in input
/// order.
pub fn predict_batch(bundle: &ArtifactBundle, rows: &[FeatureVector]) -> Vec<i64> {
    rows.iter().map(|row| predict_one(bundle, row)).collect()
}
