//! EduTrack prediction service entry point.

use std::sync::Arc;

use anyhow::{Context, Result};
use edutrack_core::{ArtifactBundle, ArtifactPaths};
use edutrack_jobs::{BulkJobRunner, JobStore};
use edutrack_rpc::{start_server, AppState};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;

use config::NodeConfig;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!(
        "starting EduTrack prediction service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = NodeConfig::load().context("failed to load configuration")?;

    let paths = ArtifactPaths {
        scaler: config.scaler_path.clone(),
        model: config.model_path.clone(),
    };
    let bundle = match ArtifactBundle::load(&paths) {
        Ok(bundle) => Arc::new(bundle),
        Err(err) => {
            // The service cannot answer a single request without the
            // fitted artifacts.
            error!("failed to load model artifacts: {err}");
            return Err(err.into());
        }
    };

    let store = JobStore::open(&config.data_dir, config.retention)
        .await
        .context("failed to open job store")?;
    let runner = Arc::new(BulkJobRunner::new(bundle.clone(), store));

    let state = AppState::new(bundle, runner, config.max_upload_bytes);

    start_server(state, &config.rpc_addr).await
}

fn init_logging() {
    let env = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
