use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path as AxumPath, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use edutrack_core::{engine, schema, ArtifactBundle, CoreError};
use edutrack_jobs::{BulkJobRunner, JobError};
use serde::Serialize;
use serde_json::{Map, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state injected into every handler.
///
/// Constructed once at startup; the artifact bundle is read-only and the
/// runner owns the job-file lifecycle, so handlers need no locking.
pub struct AppState {
    pub bundle: Arc<ArtifactBundle>,
    pub runner: Arc<BulkJobRunner>,
    pub start_time: Instant,
    pub req_count: AtomicUsize,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        bundle: Arc<ArtifactBundle>,
        runner: Arc<BulkJobRunner>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            bundle,
            runner,
            start_time: Instant::now(),
            req_count: AtomicUsize::new(0),
            max_upload_bytes,
        }
    }

    fn record_request(&self) -> u64 {
        self.req_count.fetch_add(1, Ordering::Relaxed) as u64 + 1
    }

    fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::InvalidValue { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CoreError::MissingFields(_) | CoreError::MissingColumns(_) => StatusCode::BAD_REQUEST,
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NoFile | JobError::NotCsv => {
                ApiError::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            JobError::Parse(_) => ApiError::new(StatusCode::BAD_REQUEST, err.to_string()),
            JobError::Core(core) => core.into(),
            JobError::NotFound => ApiError::new(StatusCode::NOT_FOUND, err.to_string()),
            JobError::Io(_) => {
                // File-system detail stays in the log, not the envelope.
                warn!("bulk request failed: {err}");
                ApiError::internal("internal error")
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    predicted_grade_class: i64,
}

#[derive(Debug, Serialize)]
struct BulkPredictResponse {
    message: String,
    download_url: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    req_total: u64,
    model_trees: usize,
    model_classes: usize,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    version: &'static str,
}

pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let shared = Arc::new(state);
    let app = build_router(shared);
    let listener = bind_listener(addr).await?;
    info!("prediction service listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("prediction service terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind listener on {addr}"))
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("unable to listen for shutdown signal: {err}");
    } else {
        info!("received shutdown signal");
    }
}

pub fn build_router(state: SharedState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;
    Router::new()
        .route("/", get(handle_root))
        .route("/predict", post(handle_predict))
        .route("/predict_csv", post(handle_predict_csv))
        .route("/download/:filename", get(handle_download))
        .route("/health", get(handle_health))
        .route("/version", get(handle_version))
        .route("/metrics", get(handle_metrics))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_root(State(state): State<SharedState>) -> &'static str {
    state.record_request();
    "EduTrack prediction service is running"
}

async fn handle_predict(
    State(state): State<SharedState>,
    Json(record): Json<Map<String, Value>>,
) -> Result<Json<PredictResponse>, ApiError> {
    state.record_request();

    let features = schema::vector_from_record(&record)?;
    let predicted_grade_class = engine::predict_one(&state.bundle, &features);

    Ok(Json(PredictResponse {
        predicted_grade_class,
    }))
}

async fn handle_predict_csv(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<BulkPredictResponse>, ApiError> {
    state.record_request();

    let mut upload: Option<(Option<String>, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("invalid multipart body: {err}"),
        )
    })? {
        if field.name() == Some("file") {
            let filename = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(|err| {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    format!("failed to read upload: {err}"),
                )
            })?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) = upload.ok_or(JobError::NoFile)?;
    let outcome = state.runner.run(filename.as_deref(), &bytes).await?;

    Ok(Json(BulkPredictResponse {
        message: "Predictions generated successfully".to_string(),
        download_url: format!("/download/{}", outcome.output_name),
    }))
}

async fn handle_download(
    State(state): State<SharedState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, ApiError> {
    state.record_request();

    let bytes = state.runner.store().read_output(&filename).await?;

    let disposition = format!("attachment; filename=\"{filename}\"");
    let mut response = Response::new(Body::from(bytes));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv"),
    );
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|err| ApiError::internal(format!("invalid download name: {err}")))?,
    );
    Ok(response)
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let req_total = state.record_request();
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_seconds(),
        req_total,
        model_trees: state.bundle.forest.trees.len(),
        model_classes: state.bundle.forest.classes.len(),
    })
}

async fn handle_version(State(state): State<SharedState>) -> Json<VersionResponse> {
    state.record_request();
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn handle_metrics(State(state): State<SharedState>) -> Response {
    let req_total = state.record_request();
    let uptime = state.uptime_seconds();

    let mut metrics =
        "# HELP edutrack_http_requests_total Total number of requests handled\n".to_string();
    metrics.push_str("# TYPE edutrack_http_requests_total counter\n");
    metrics.push_str(&format!("edutrack_http_requests_total {req_total}\n"));
    metrics.push_str("# HELP edutrack_uptime_seconds Uptime of the service in seconds\n");
    metrics.push_str("# TYPE edutrack_uptime_seconds gauge\n");
    metrics.push_str(&format!("edutrack_uptime_seconds {uptime}\n"));
    metrics.push_str("# HELP edutrack_model_trees Trees in the loaded classifier\n");
    metrics.push_str("# TYPE edutrack_model_trees gauge\n");
    metrics.push_str(&format!(
        "edutrack_model_trees {}\n",
        state.bundle.forest.trees.len()
    ));

    let mut response = Response::new(Body::from(metrics));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    response
}
