//! Loading and validation of the fitted scaler and classifier.
//!
//! Both artifacts are produced offline by the training pipeline and are
//! treated as opaque, versioned inputs. They are loaded once at startup
//! and shared read-only for the lifetime of the process.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::ArtifactError;
use crate::forest::Forest;
use crate::scaler::Scaler;
use crate::schema::FEATURE_COUNT;

/// Supported classifier artifact format version.
pub const ARTIFACT_VERSION: u32 = 1;

/// Locations of the two artifacts on disk.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    /// Fitted scaler (JSON).
    pub scaler: PathBuf,
    /// Fitted classifier (JSON).
    pub model: PathBuf,
}

/// The fitted scaler and classifier, immutable after load.
#[derive(Debug)]
pub struct ArtifactBundle {
    pub scaler: Scaler,
    pub forest: Forest,
}

impl ArtifactBundle {
    /// Load and validate both artifacts.
    ///
    /// Any failure here is fatal to startup: the process cannot serve
    /// predictions without a usable bundle.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let scaler: Scaler = read_json(&paths.scaler)?;
        scaler.validate().map_err(ArtifactError::Incompatible)?;

        let forest: Forest = read_json(&paths.model)?;
        if forest.version != ARTIFACT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: forest.version,
                expected: ARTIFACT_VERSION,
            });
        }
        forest.validate().map_err(ArtifactError::Incompatible)?;
        if forest.feature_count != FEATURE_COUNT {
            return Err(ArtifactError::Incompatible(format!(
                "classifier expects {} features, schema has {}",
                forest.feature_count, FEATURE_COUNT
            )));
        }

        info!(
            trees = forest.trees.len(),
            classes = forest.classes.len(),
            "model artifacts loaded"
        );

        Ok(Self { scaler, forest })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Malformed {
        path: path.display().to_string(),
        source,
    })
}
