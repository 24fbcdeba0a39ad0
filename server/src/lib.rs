use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use docsearch_core::engine::EngineStats;
use docsearch_core::rank::{DocTypeFilter, EntityFilter};
use docsearch_core::{Document, NewDocument, SearchEngine, SearchHit, SearchRequest};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default, alias = "query")]
    pub q: String,
    #[serde(default = "default_all")]
    pub doc_type: String,
    #[serde(default = "default_all")]
    pub entity_type: String,
    #[serde(default)]
    pub entity_value: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}
fn default_all() -> String { "all".to_string() }

impl SearchParams {
    fn to_request(&self) -> Result<SearchRequest, (StatusCode, String)> {
        let bad = |e: anyhow::Error| (StatusCode::BAD_REQUEST, e.to_string());
        Ok(SearchRequest {
            query: self.q.clone(),
            doc_type: self.doc_type.parse::<DocTypeFilter>().map_err(bad)?,
            entity_type: self.entity_type.parse::<EntityFilter>().map_err(bad)?,
            entity_value: self.entity_value.clone(),
            limit: self.limit,
        })
    }
}

/// Process-level settings read from the environment.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// When set, ingest requires a matching X-ADMIN-TOKEN header.
    pub admin_token: Option<String>,
    /// Comma-separated allowed origins; any origin when unset.
    pub cors_allow_origin: Option<String>,
}

impl AppOptions {
    pub fn from_env() -> Self {
        Self {
            admin_token: std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub admin_token: Option<String>,
}

fn cors_layer(allow: Option<&str>) -> CorsLayer {
    let any = || CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    match allow {
        Some(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                any()
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        None => any(),
    }
}

pub fn build_app(engine: Arc<SearchEngine>, opts: AppOptions) -> Router {
    let cors = cors_layer(opts.cors_allow_origin.as_deref());
    let app_state = AppState { engine, admin_token: opts.admin_token };

    Router::new()
        .route("/", get(status_handler))
        .route("/health", get(|| async { "ok" }))
        .route("/stats", get(stats_handler))
        .route("/search", get(search_handler))
        .route("/documents/:id", get(doc_handler))
        .route("/admin/documents", post(add_document))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn status_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "docs_count": state.engine.len() }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<EngineStats> { Json(state.engine.stats()) }

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let req = params.to_request()?;
    let hits = state.engine.search(&req);
    tracing::debug!(query = %req.query, hits = hits.len(), took_s = start.elapsed().as_secs_f64(), "search");
    Ok(Json(hits))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, (StatusCode, String)> {
    state
        .engine
        .get(&id)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, "not found".into()))
}

async fn add_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewDocument>,
) -> Result<Json<Document>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let engine = Arc::clone(&state.engine);
    let doc = tokio::task::spawn_blocking(move || engine.ingest(payload))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::error!(error = %e, "ingest failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("ingest failed: {e}"))
        })?;
    Ok(Json(doc))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let Some(required) = &state.admin_token else { return Ok(()) };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
