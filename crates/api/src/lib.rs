mod rate_limit;

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Json, Router};
use chrono::Utc;
use copilot_core::{ChatInput, PolicyStore, RetrievedPassage, TurnOutcome};
use copilot_llm::GeminiClient;
use copilot_observability::{AppMetrics, MetricsSnapshot};
use copilot_pipeline::{ClassifierMode, CopilotAgent, PipelineConfig};
use copilot_retrieval::{KeywordRetriever, PolicyRetriever};
use copilot_storage::Store;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::rate_limit::IpRateLimiter;

const DEFAULT_API_KEY: &str = "dev-copilot-key";
const MAX_BODY_BYTES: usize = 64 * 1024;

pub type Agent = CopilotAgent<Store, GeminiClient>;

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<Agent>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: IpRateLimiter,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub classifier_mode: &'static str,
    pub kb_docs: usize,
    pub model_configured: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
    capabilities: Capabilities,
}

#[derive(Debug, Deserialize)]
struct ResetRequest {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    session_id: String,
    cleared: bool,
}

#[derive(Debug, Deserialize)]
struct KbSearchParams {
    q: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    copilot_retrieval::DEFAULT_TOP_K
}

/// Model-assisted mode is only honored when a client actually exists, so
/// `/health` never advertises a classifier the pipeline cannot run.
fn resolve_classifier_mode(setting: Option<&str>, model_configured: bool) -> ClassifierMode {
    match setting {
        Some("model") if model_configured => ClassifierMode::ModelAssisted,
        Some("model") => {
            tracing::warn!("COPILOT_CLASSIFIER=model but no model is configured, using rules");
            ClassifierMode::Rules
        }
        Some("rules") => ClassifierMode::Rules,
        _ if model_configured => ClassifierMode::ModelAssisted,
        _ => ClassifierMode::Rules,
    }
}

pub async fn build_app(kb_root: impl AsRef<Path>) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let retriever = KeywordRetriever::from_corpus_dir(kb_root.as_ref()).with_context(|| {
        format!(
            "failed loading policy corpus from {}",
            kb_root.as_ref().display()
        )
    })?;
    let kb_docs = retriever.stats().docs_loaded;

    let policies = match env::var("COPILOT_POLICY_FILE") {
        Ok(path) => PolicyStore::from_json_file(&path)?,
        Err(_) => PolicyStore::default(),
    };

    let store = if let Ok(database_url) = env::var("COPILOT_DATABASE_URL") {
        Store::sqlite(&database_url).await?
    } else {
        Store::memory()
    };

    let model = GeminiClient::from_env();
    let mode = resolve_classifier_mode(
        env::var("COPILOT_CLASSIFIER").ok().as_deref(),
        model.is_some(),
    );

    let capabilities = Capabilities {
        classifier_mode: match mode {
            ClassifierMode::Rules => "rules",
            ClassifierMode::ModelAssisted => "model_assisted",
        },
        kb_docs,
        model_configured: model.is_some(),
    };

    let agent = Arc::new(CopilotAgent::new(
        Arc::new(retriever) as Arc<dyn PolicyRetriever>,
        model,
        policies,
        Arc::new(store),
        metrics.clone(),
        PipelineConfig {
            mode,
            ..PipelineConfig::default()
        },
    ));

    let state = ApiState {
        agent,
        metrics,
        api_key: env::var("COPILOT_API_KEY").unwrap_or_else(|_| DEFAULT_API_KEY.to_string()),
        limiter: IpRateLimiter::new(Duration::from_secs(60), 60),
        capabilities,
    };

    let guarded = Router::new()
        .route("/v1/chat", post(chat))
        .route("/v1/reset", post(reset))
        .route("/v1/kb/search", get(kb_search))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let app = Router::new()
        .route("/health", get(health))
        .merge(guarded)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state);

    Ok(app)
}

async fn require_api_key(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client_key = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("local")
        .to_string();

    if !state.limiter.allow(&client_key) {
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }

    let presented = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    if presented != Some(state.api_key.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    next.run(request).await
}

async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp_utc: Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        capabilities: state.capabilities.clone(),
    })
}

async fn chat(
    State(state): State<ApiState>,
    Json(input): Json<ChatInput>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let outcome = state.agent.submit(input).await?;
    Ok(Json(outcome))
}

async fn reset(
    State(state): State<ApiState>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<ResetResponse>, ApiError> {
    state.agent.reset_history(&request.session_id).await?;
    Ok(Json(ResetResponse {
        session_id: request.session_id,
        cleared: true,
    }))
}

async fn kb_search(
    State(state): State<ApiState>,
    Query(params): Query<KbSearchParams>,
) -> Json<Vec<RetrievedPassage>> {
    Json(state.agent.kb_search(&params.q, params.limit.min(20)))
}

struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}
