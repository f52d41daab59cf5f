use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, response::{IntoResponse, Response}, routing::{get, post}, Json, Router};
use cinematch_core::{CatalogItem, CoreError, IndexConfig, SharedSnapshot, Snapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod reply;
pub mod source;

pub use reply::format_reply;
pub use source::{fetch_catalog, refresh_catalog, SnapshotSource};

pub const DEFAULT_K: usize = 5;
pub const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct RecommendParams {
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct RecommendResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub results: Vec<RecommendHit>,
    /// Chat-ready rendering of `results`.
    pub reply: String,
}

#[derive(Serialize)]
pub struct RecommendHit {
    pub position: usize,
    pub id: String,
    pub title: String,
    pub year: String,
    pub genre: Option<String>,
    pub description: String,
    pub score: f32,
}

/// Error body; `reply` is what a chat front end should show the user.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message, "reply": reply::FAILURE });
        (self.status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match err {
            CoreError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CoreError::EmptyCorpus | CoreError::InconsistentIndex { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<SharedSnapshot>,
    /// Reload is disabled when unset.
    pub source: Option<Arc<SnapshotSource>>,
    pub index_config: IndexConfig,
    pub http: reqwest::Client,
    pub admin_token: Option<String>,
    pub default_k: usize,
    pub max_k: usize,
    /// Held for the whole of a reload so snapshots are published in request order.
    pub reload_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(SharedSnapshot::new(snapshot)),
            source: None,
            index_config: IndexConfig::default(),
            http: reqwest::Client::new(),
            admin_token: None,
            default_k: DEFAULT_K,
            max_k: MAX_K,
            reload_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn with_source(mut self, source: SnapshotSource, index_config: IndexConfig) -> Self {
        self.source = Some(Arc::new(source));
        self.index_config = index_config;
        self
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }
}

fn cors_layer() -> CorsLayer {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/recommend", get(recommend_handler))
        .route("/items/:position", get(item_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

pub async fn recommend_handler(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let start = std::time::Instant::now();
    let k = params.k.unwrap_or(state.default_k).min(state.max_k);
    let snapshot = state.snapshot.current();
    let matches = snapshot.recommend(&params.q, k)?;

    let reply = format_reply(&matches);
    let results: Vec<RecommendHit> = matches
        .iter()
        .map(|m| RecommendHit {
            position: m.position,
            id: m.item.id.clone(),
            title: m.item.title.clone(),
            year: m.item.year.clone(),
            genre: m.item.genre.clone(),
            description: m.item.description.clone(),
            score: m.score,
        })
        .collect();

    let elapsed = start.elapsed();
    if results.is_empty() {
        tracing::info!(query = %params.q, "no similar movies found");
    } else {
        tracing::info!(query = %params.q, hits = results.len(), took_ms = elapsed.as_millis() as u64, "recommended");
    }
    Ok(Json(RecommendResponse { query: params.q, took_ms: elapsed.as_millis(), took_s: elapsed.as_secs_f64(), results, reply }))
}

pub async fn item_handler(State(state): State<AppState>, Path(position): Path<usize>) -> Result<Json<CatalogItem>, ApiError> {
    let snapshot = state.snapshot.current();
    snapshot
        .items()
        .get(position)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "not found"))
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let source = state
        .source
        .as_ref()
        .ok_or_else(|| ApiError::new(StatusCode::CONFLICT, "no reload source configured"))?;
    let _reloading = state.reload_lock.lock().await;

    let snapshot = source.load(&state.http, state.index_config).await.map_err(|e| {
        tracing::error!(error = %e, "reload failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {e:#}"))
    })?;
    let num_docs = snapshot.len();
    let num_terms = snapshot.index().vocabulary_len();
    let previous = state.snapshot.replace(snapshot);

    Ok(Json(serde_json::json!({
        "num_docs": num_docs,
        "num_terms": num_terms,
        "previous_num_docs": previous.len(),
    })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::new(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::new(StatusCode::UNAUTHORIZED, "invalid admin token"))
    }
}
