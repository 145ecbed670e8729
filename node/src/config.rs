//! Service configuration: environment variables with an optional TOML file.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Listen address for the HTTP server.
    pub rpc_addr: String,
    /// Fitted scaler artifact (JSON).
    pub scaler_path: PathBuf,
    /// Fitted classifier artifact (JSON).
    pub model_path: PathBuf,
    /// Root directory for uploaded and predicted job files.
    pub data_dir: PathBuf,
    /// Retention window for job files.
    pub retention: Duration,
    /// Upload size cap.
    pub max_upload_bytes: usize,
}

/// On-disk configuration shape. Every key is optional; environment
/// variables override the file, and built-in defaults fill the rest.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    rpc_addr: Option<String>,
    scaler_path: Option<PathBuf>,
    model_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    retention_secs: Option<u64>,
    max_upload_bytes: Option<usize>,
}

impl NodeConfig {
    /// Load configuration: defaults, then the `EDUTRACK_CONFIG` TOML file
    /// if set, then environment overrides.
    pub fn load() -> Result<Self> {
        let file = match env::var("EDUTRACK_CONFIG") {
            Ok(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {path}"))?;
                toml::from_str(&content)
                    .with_context(|| format!("failed to parse config file {path}"))?
            }
            Err(_) => ConfigFile::default(),
        };

        Ok(Self {
            rpc_addr: env::var("EDUTRACK_RPC_ADDR")
                .ok()
                .or(file.rpc_addr)
                .unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            scaler_path: env_path("EDUTRACK_SCALER_PATH")
                .or(file.scaler_path)
                .unwrap_or_else(|| PathBuf::from("models/scaler.json")),
            model_path: env_path("EDUTRACK_MODEL_PATH")
                .or(file.model_path)
                .unwrap_or_else(|| PathBuf::from("models/model.json")),
            data_dir: env_path("EDUTRACK_DATA_DIR")
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from("data")),
            retention: Duration::from_secs(
                env_u64("EDUTRACK_RETENTION_SECS")
                    .or(file.retention_secs)
                    .unwrap_or(3600),
            ),
            max_upload_bytes: env_u64("EDUTRACK_MAX_UPLOAD_BYTES")
                .map(|value| value as usize)
                .or(file.max_upload_bytes)
                .unwrap_or(10 * 1024 * 1024),
        })
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key).ok().map(PathBuf::from)
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_parses_partial_document() {
        let file: ConfigFile = toml::from_str(
            r#"
            rpc_addr = "0.0.0.0:9090"
            retention_secs = 120
            "#,
        )
        .unwrap();

        assert_eq!(file.rpc_addr.as_deref(), Some("0.0.0.0:9090"));
        assert_eq!(file.retention_secs, Some(120));
        assert!(file.model_path.is_none());
    }

    #[test]
    fn test_config_file_parses_empty_document() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert!(file.rpc_addr.is_none());
        assert!(file.max_upload_bytes.is_none());
    }
}
