//! HTTP API for recommendation queries, health checks and Prometheus metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use carbon_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    observability::{CarbonMetrics, StructuredLogger},
    session::DatacenterSummary,
    CarbonError, EquivalenceKind, RecommendationResult, SavingsProjector, SavingsReport, Session,
    UsageProfile,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{error, info};

/// Latency budget used when a request does not name one
pub const DEFAULT_LATENCY_BUDGET_MS: f64 = 50.0;

/// Shared application state
///
/// The session is installed exactly once, after the dataset has been loaded
/// and the distance index built. Until then query endpoints answer 503.
#[derive(Clone)]
pub struct AppState {
    session: Arc<OnceLock<Arc<Session>>>,
    pub health_registry: HealthRegistry,
    pub metrics: CarbonMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: CarbonMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            session: Arc::new(OnceLock::new()),
            health_registry,
            metrics,
            logger,
        }
    }

    /// Register the session components as not yet initialized
    pub async fn register_components(&self) {
        self.health_registry.register(components::DATASET).await;
        self.health_registry.register(components::DISTANCE_INDEX).await;
    }

    /// Publish the built session; a second call is ignored
    pub async fn install_session(&self, session: Session) {
        if self.session.set(Arc::new(session)).is_err() {
            error!("Session already installed, ignoring rebuilt session");
            return;
        }
        if let Some(session) = self.session.get() {
            self.logger.log_session_ready(session);
            self.health_registry.assess_session(session).await;
        }
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.get()
    }
}

/// Errors returned by query endpoints
#[derive(Debug)]
pub enum ApiError {
    NotReady,
    Query(CarbonError),
}

impl From<CarbonError> for ApiError {
    fn from(err: CarbonError) -> Self {
        ApiError::Query(err)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_ready".to_string(),
                "Dataset is still loading".to_string(),
            ),
            ApiError::Query(err) => {
                let status = match &err {
                    CarbonError::MissingData { .. } | CarbonError::UnknownDatacenter(_) => {
                        StatusCode::NOT_FOUND
                    }
                    CarbonError::InvalidUsageProfile { .. }
                    | CarbonError::UnsupportedEquivalenceKind(_) => StatusCode::BAD_REQUEST,
                    CarbonError::Dataset(_) | CarbonError::Parse(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.kind().to_string(), err.to_string())
            }
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}

/// Body of `POST /api/v1/recommendation`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub current_datacenter: String,
    /// Activity subtypes to average over, empty for all
    #[serde(default)]
    pub subtypes: Vec<String>,
    #[serde(default = "default_latency_ms")]
    pub latency_ms: f64,
    /// When present, the response includes a savings report
    #[serde(default)]
    pub usage: Option<UsageProfile>,
    #[serde(default)]
    pub equivalence: Option<String>,
}

fn default_latency_ms() -> f64 {
    DEFAULT_LATENCY_BUDGET_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    #[serde(flatten)]
    pub result: RecommendationResult,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub savings: Option<SavingsReport>,
}

/// Body of `POST /api/v1/savings`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsRequest {
    pub per_core_delta_kg: f64,
    pub usage: UsageProfile,
    #[serde(default)]
    pub equivalence: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsResponse {
    pub annual_co2e_kg: f64,
    pub equivalence: EquivalenceKind,
    pub equivalent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatacenterList {
    pub datacenters: Vec<DatacenterSummary>,
    pub activity_types: Vec<String>,
    pub subtypes: Vec<String>,
}

fn parse_equivalence(kind: Option<&str>) -> Result<EquivalenceKind, CarbonError> {
    kind.map(str::parse::<EquivalenceKind>).transpose().map(Option::unwrap_or_default)
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 once the session is built
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
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn list_datacenters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DatacenterList>, ApiError> {
    let session = state.session().ok_or(ApiError::NotReady)?;
    let dataset = session.dataset();

    Ok(Json(DatacenterList {
        datacenters: session.overview(),
        activity_types: dataset.activity_types().into_iter().map(String::from).collect(),
        subtypes: dataset.subtypes().into_iter().map(String::from).collect(),
    }))
}

async fn recommend(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let session = state.session().ok_or(ApiError::NotReady)?;

    // Session::recommend counts its own failures
    let answer = validate_recommendation(&request)
        .inspect_err(|err| state.metrics.inc_query_errors(err.kind()))
        .and_then(|equivalence| answer_recommendation(&state, session, &request, equivalence));
    if let Err(err) = &answer {
        state.logger.log_query_failed("recommendation", err);
    }
    Ok(Json(answer?))
}

/// Reject a malformed request before it reaches the recommender
fn validate_recommendation(request: &RecommendationRequest) -> Result<EquivalenceKind, CarbonError> {
    let equivalence = parse_equivalence(request.equivalence.as_deref())?;
    if let Some(usage) = &request.usage {
        usage.validate()?;
    }
    Ok(equivalence)
}

fn answer_recommendation(
    state: &AppState,
    session: &Session,
    request: &RecommendationRequest,
    equivalence: EquivalenceKind,
) -> Result<RecommendationResponse, CarbonError> {
    let result = session.recommend(
        &request.current_datacenter,
        &request.subtypes,
        request.latency_ms,
    )?;
    state.logger.log_recommendation(&result);

    let savings = match &request.usage {
        Some(usage) => {
            let report = SavingsProjector::new(equivalence).report(&result, usage)?;
            state.metrics.inc_savings_projections();
            state.logger.log_savings(&report);
            Some(report)
        }
        None => None,
    };

    Ok(RecommendationResponse { result, savings })
}

async fn project_savings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SavingsRequest>,
) -> Result<Json<SavingsResponse>, ApiError> {
    let answer = answer_savings(&request);
    match &answer {
        Ok(_) => state.metrics.inc_savings_projections(),
        Err(err) => {
            state.metrics.inc_query_errors(err.kind());
            state.logger.log_query_failed("savings", err);
        }
    }
    Ok(Json(answer?))
}

fn answer_savings(request: &SavingsRequest) -> Result<SavingsResponse, CarbonError> {
    let equivalence = parse_equivalence(request.equivalence.as_deref())?;
    let projector = SavingsProjector::new(equivalence);
    let annual_co2e_kg = projector.project_annual_co2e(request.per_core_delta_kg, &request.usage)?;

    Ok(SavingsResponse {
        annual_co2e_kg,
        equivalence,
        equivalent: equivalence.describe(annual_co2e_kg),
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/datacenters", get(list_datacenters))
        .route("/api/v1/recommendation", post(recommend))
        .route("/api/v1/savings", post(project_savings))
        .with_state(state)
}

/// Start the API server, returning once `shutdown` resolves
pub async fn serve<F>(port: u16, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
