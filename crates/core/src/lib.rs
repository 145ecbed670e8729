//! Core inference pipeline for the EduTrack prediction service.
//!
//! Provides:
//! - The canonical feature schema and record/table validation
//! - The frozen standardization scaler
//! - The grade-class decision forest
//! - The artifact bundle loaded once at startup and shared read-only

pub mod artifacts;
pub mod engine;
pub mod errors;
pub mod forest;
pub mod scaler;
pub mod schema;

pub use artifacts::{ArtifactBundle, ArtifactPaths, ARTIFACT_VERSION};
pub use engine::{predict_batch, predict_one};
pub use errors::{ArtifactError, CoreError};
pub use forest::{Forest, Node, Tree};
pub use scaler::Scaler;
pub use schema::{FeatureTable, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
