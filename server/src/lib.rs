use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sieve_core::highlight::{DEFAULT_INDICATOR, DEFAULT_PREV_COUNT, DEFAULT_REL_LENGTH};
use sieve_core::{DocId, Error, HighlightOptions, MemoryStore, SearchConfig, Searcher};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod load;

pub use load::{DocMeta, InputDoc, INDEX_NAME};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize {
    10
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    /// Absent for boolean queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub title: String,
    pub url: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub searcher: Arc<Searcher<MemoryStore>>,
    pub docs: Arc<HashMap<DocId, DocMeta>>,
}

type ApiError = (StatusCode, String);

pub fn build_app(docs_path: &str, config: SearchConfig) -> Result<Router> {
    let input = load::read_documents(std::path::Path::new(docs_path))?;
    let (store, docs) = load::build_store(input, &config)?;
    let mut searcher = Searcher::new(store, config)?;
    searcher.select_index(INDEX_NAME)?;
    let app_state = AppState { searcher: Arc::new(searcher), docs: Arc::new(docs) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
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
        .route("/search/boolean", get(boolean_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

fn api_error(err: Error) -> ApiError {
    tracing::error!(error = %err, "query failed");
    match err {
        Error::IndexNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn filesystem_index() -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, "filesystem indexes are not served".into())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();
    let k = params.k.clamp(1, 100);
    let result = state
        .searcher
        .search(&params.q, k)
        .map_err(api_error)?
        .documents()
        .ok_or_else(filesystem_index)?;

    let results = result
        .ids
        .iter()
        .filter_map(|&doc_id| hit(&state, &params.q, doc_id, result.doc_scores.get(&doc_id).copied()))
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        total_hits: result.hits,
        results,
    }))
}

pub async fn boolean_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();
    let k = params.k.clamp(1, 100);
    let result = state
        .searcher
        .search_boolean(&params.q, k)
        .map_err(api_error)?
        .documents()
        .ok_or_else(filesystem_index)?;

    // Operators and negated terms are not worth highlighting.
    let words: String = params
        .q
        .split(|c: char| matches!(c, '&' | '|' | '(' | ')') || c.is_whitespace())
        .filter(|w| !w.is_empty() && !w.starts_with(['-', '~']) && !w.eq_ignore_ascii_case("or"))
        .collect::<Vec<_>>()
        .join(" ");
    let results = result.ids.iter().filter_map(|&doc_id| hit(&state, &words, doc_id, None)).collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        total_hits: result.hits,
        results,
    }))
}

fn hit(state: &AppState, words: &str, doc_id: DocId, score: Option<f64>) -> Option<SearchHit> {
    let meta = state.docs.get(&doc_id)?;
    Some(SearchHit {
        doc_id,
        score,
        title: meta.title.clone(),
        url: meta.url.clone(),
        snippet: snippet(&state.searcher, words, &meta.text),
    })
}

/// Most relevant excerpt of `text` with the query words wrapped in `<em>`.
fn snippet(searcher: &Searcher<MemoryStore>, words: &str, text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let excerpt = searcher.snippet(words, text, DEFAULT_REL_LENGTH, DEFAULT_PREV_COUNT, DEFAULT_INDICATOR);
    if words.trim().is_empty() {
        return Some(excerpt);
    }
    match searcher.highlight(&excerpt, words, "em", &HighlightOptions::default()) {
        Ok(highlighted) => Some(highlighted),
        Err(err) => {
            tracing::warn!(error = %err, "highlight failed");
            Some(excerpt)
        }
    }
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<u32>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.docs.get(&doc_id) {
        Some(meta) => Ok(Json(serde_json::json!({
            "doc_id": doc_id,
            "external_id": meta.external_id,
            "title": meta.title,
            "url": meta.url,
            "text": meta.text,
        }))),
        None => Err((StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" })))),
    }
}
