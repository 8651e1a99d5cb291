use anyhow::{Context, Result};
use axum::{extract::{Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use catalog_core::persist::IndexPaths;
use catalog_core::{Document, MatchMode, RankingWeights, SearchEngine, SearchResult, SynonymMap};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub index_dir: PathBuf,
    /// Synonym map JSON; the built-in origin groups when absent.
    pub synonyms: Option<PathBuf>,
    /// Guards the reload endpoint. Reload is refused when unset.
    pub admin_token: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default = "default_k")]
    pub k: usize,
    pub bm25: Option<f64>,
    pub exact_match: Option<f64>,
    pub review: Option<f64>,
    pub title_match: Option<f64>,
    pub origin_match: Option<f64>,
}
fn default_k() -> usize { 10 }

impl SearchParams {
    fn weights(&self) -> RankingWeights {
        let d = RankingWeights::default();
        RankingWeights {
            bm25: self.bm25.unwrap_or(d.bm25),
            exact_match: self.exact_match.unwrap_or(d.exact_match),
            review: self.review.unwrap_or(d.review),
            title_match: self.title_match.unwrap_or(d.title_match),
            origin_match: self.origin_match.unwrap_or(d.origin_match),
        }
    }
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub took_s: f64,
    #[serde(flatten)]
    pub result: SearchResult,
}

#[derive(Deserialize)]
pub struct DocParams {
    pub url: String,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Swapped whole on reload; readers clone the inner Arc and drop the lock.
    pub engine: Arc<RwLock<Arc<SearchEngine>>>,
}

impl AppState {
    pub fn engine(&self) -> Arc<SearchEngine> { self.engine.read().clone() }
}

pub fn load_engine(config: &ServerConfig) -> Result<SearchEngine> {
    let synonyms = match &config.synonyms {
        Some(p) => SynonymMap::from_json_file(p).with_context(|| format!("reading synonyms from {}", p.display()))?,
        None => SynonymMap::builtin_origins(),
    };
    let engine = SearchEngine::open(&IndexPaths::new(&config.index_dir), synonyms)
        .with_context(|| format!("opening index at {}", config.index_dir.display()))?;
    Ok(engine)
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    // Refuse to start on an incomplete index
    let engine = load_engine(&config)?;
    tracing::info!(num_docs = engine.bundle().num_docs(), "index loaded");
    let app_state = AppState { config: Arc::new(config), engine: Arc::new(RwLock::new(Arc::new(engine))) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
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
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc", get(doc_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let weights = params.weights();
    let engine = state.engine();
    let mut result = engine
        .search(&params.q, params.mode, &weights)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    result.truncate(params.k.clamp(1, 100));

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { took_s: elapsed.as_secs_f64(), result }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Query(params): Query<DocParams>,
) -> Result<Json<Document>, (StatusCode, String)> {
    let engine = state.engine();
    match engine.bundle().document(&params.url) {
        Some(doc) => Ok(Json(doc.clone())),
        None => Err((StatusCode::NOT_FOUND, "not found".into())),
    }
}

/// Load a fresh bundle from disk and swap it in. In-flight queries keep the
/// engine they already cloned.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let config = state.config.clone();
    let engine = tokio::task::spawn_blocking(move || load_engine(&config))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::error!(error = %e, "reload failed, keeping current index");
            (StatusCode::SERVICE_UNAVAILABLE, format!("{e:#}"))
        })?;
    let num_docs = engine.bundle().num_docs();
    *state.engine.write() = Arc::new(engine);
    tracing::info!(num_docs, "index reloaded");
    Ok(Json(serde_json::json!({ "num_docs": num_docs })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.config.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
