//! HTTP API for footprint computations, health checks and Prometheus metrics

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use footprint_lib::{
    bin_values, compute_report,
    health::{ComponentStatus, HealthRegistry},
    histogram::MetricHistogram,
    peak_histogram, select_weights,
    units::ChartValue,
    ClusterRegistry, FootprintError, FootprintMetrics, FootprintReport, FootprintWeights, Prefix,
    Scope, StatsUpdate, StructuredLogger,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: FootprintMetrics,
    pub logger: StructuredLogger,
    pub clusters: Arc<ClusterRegistry>,
    pub default_bins: usize,
    /// Feeds the background refresher, when one is running
    pub updates: Option<mpsc::Sender<StatsUpdate>>,
    pub latest: Option<watch::Receiver<Option<FootprintReport>>>,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: FootprintMetrics,
        logger: StructuredLogger,
        clusters: Arc<ClusterRegistry>,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            logger,
            clusters,
            default_bins: 10,
            updates: None,
            latest: None,
        }
    }

    pub fn with_default_bins(mut self, bins: usize) -> Self {
        self.default_bins = bins;
        self
    }

    /// Attach the channel ends of a running refresher
    pub fn with_refresher(
        mut self,
        updates: mpsc::Sender<StatsUpdate>,
        latest: watch::Receiver<Option<FootprintReport>>,
    ) -> Self {
        self.updates = Some(updates);
        self.latest = Some(latest);
        self
    }
}

/// Error body returned by every API route
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Library errors rendered as JSON responses
pub struct ApiError(FootprintError);

impl From<FootprintError> for ApiError {
    fn from(e: FootprintError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            FootprintError::UnknownCluster(_) | FootprintError::UnknownMetric { .. } => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn observe(state: &AppState, start: Instant) {
    state
        .metrics
        .observe_request_latency(start.elapsed().as_secs_f64());
}

/// Classify a job's footprint metrics
async fn footprint(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StatsUpdate>,
) -> ApiResult<FootprintReport> {
    let start = Instant::now();
    let report = compute_report(&state.clusters, &state.logger, &state.metrics, request);
    observe(&state, start);
    Ok(Json(report?))
}

/// Values to bin, weighted by explicit `weights` or by the `scope` hours
/// of per-job `jobs`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramRequest {
    pub values: Vec<f64>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    #[serde(default)]
    pub jobs: Option<Vec<FootprintWeights>>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub num_bins: Option<usize>,
}

async fn histogram(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HistogramRequest>,
) -> ApiResult<footprint_lib::Histogram> {
    let start = Instant::now();
    let num_bins = request.num_bins.unwrap_or(state.default_bins);
    let weights = select_weights(request.weights, request.jobs.as_deref(), request.scope)?;
    let result = bin_values(weights.as_deref(), &request.values, Some(num_bins));
    observe(&state, start);

    let histogram = result?;
    state.metrics.inc_histograms();
    state
        .logger
        .log_histogram("weighted", request.values.len(), histogram.bins.len());
    Ok(Json(histogram))
}

/// Peak-anchored histogram; the peak comes from the request or the cluster
/// configuration of `metric`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakHistogramRequest {
    pub values: Vec<f64>,
    #[serde(default)]
    pub peak: Option<f64>,
    #[serde(default)]
    pub bins: Option<usize>,
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub cluster: Option<String>,
}

async fn peak_histogram_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PeakHistogramRequest>,
) -> ApiResult<MetricHistogram> {
    let start = Instant::now();
    let metric = request.metric.clone().unwrap_or_default();

    let (peak, unit) = match (request.peak, request.metric.as_deref()) {
        (Some(peak), _) => (peak, String::new()),
        (None, Some(metric)) => {
            let (peak, unit) = state.clusters.peak(request.cluster.as_deref(), metric)?;
            (peak, unit.to_string())
        }
        (None, None) => {
            return Err(FootprintError::InvalidInput(
                "either peak or metric is required".to_string(),
            )
            .into())
        }
    };

    let data = peak_histogram(&request.values, peak, request.bins);
    observe(&state, start);
    let data = data?;
    state.metrics.inc_histograms();
    state
        .logger
        .log_histogram("peak", request.values.len(), data.len());

    Ok(Json(MetricHistogram { metric, unit, data }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Formatted {
    pub formatted: String,
}

#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    pub value: String,
}

async fn format_value(Query(query): Query<FormatQuery>) -> Json<Formatted> {
    Json(Formatted {
        formatted: ChartValue::parse(&query.value).format(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ScaleQuery {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub prefix: String,
}

async fn scale(Query(query): Query<ScaleQuery>) -> ApiResult<Formatted> {
    let prefix = Prefix::from_symbol(&query.prefix)?;
    Ok(Json(Formatted {
        formatted: footprint_lib::scale_numbers(query.x, query.y, prefix),
    }))
}

/// Queue fresh job statistics for the background refresher
async fn submit_stats(
    State(state): State<Arc<AppState>>,
    Json(update): Json<StatsUpdate>,
) -> StatusCode {
    let Some(updates) = &state.updates else {
        return StatusCode::SERVICE_UNAVAILABLE;
    };
    match updates.send(update).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(e) => {
            warn!(error = %e, "Refresher is not accepting updates");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Most recent report published by the refresher
async fn latest_report(State(state): State<Arc<AppState>>) -> Response {
    let report = state.latest.as_ref().and_then(|rx| rx.borrow().clone());
    match report {
        Some(report) => Json(report).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Health check response - 200 if operational, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/footprint", post(footprint))
        .route("/api/v1/footprint/latest", get(latest_report))
        .route("/api/v1/jobs/stats", post(submit_stats))
        .route("/api/v1/histogram", post(histogram))
        .route("/api/v1/histogram/peak", post(peak_histogram_handler))
        .route("/api/v1/units/format", get(format_value))
        .route("/api/v1/units/scale", get(scale))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
