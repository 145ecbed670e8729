//! Frozen standardization transform.
//!
//! Statistics are fitted offline at training time and applied identically
//! at inference time: `(x - mean) / stddev` per column.

use serde::{Deserialize, Serialize};

use crate::schema::{FeatureVector, FEATURE_COUNT};

/// Per-column standardization statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scaler {
    /// Per-column mean.
    pub mean: Vec<f64>,
    /// Per-column standard deviation.
    pub scale: Vec<f64>,
}

impl Scaler {
    /// Check the statistics against the expected column count.
    pub fn validate(&self) -> Result<(), String> {
        if self.mean.len() != FEATURE_COUNT || self.scale.len() != FEATURE_COUNT {
            return Err(format!(
                "scaler has {} mean / {} scale entries, expected {}",
                self.mean.len(),
                self.scale.len(),
                FEATURE_COUNT
            ));
        }
        for (column, (&mean, &scale)) in self.mean.iter().zip(self.scale.iter()).enumerate() {
            if !mean.is_finite() || !scale.is_finite() {
                return Err(format!("non-finite statistics for column {column}"));
            }
            if scale == 0.0 {
                return Err(format!("zero standard deviation for column {column}"));
            }
        }
        Ok(())
    }

    /// Standardize one row.
    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut scaled = [0.0; FEATURE_COUNT];
        for (column, slot) in scaled.iter_mut().enumerate() {
            *slot = (features[column] - self.mean[column]) / self.scale[column];
        }
        scaled
    }
}
