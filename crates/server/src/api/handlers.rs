//! HTTP request handlers and shared application state.

use crate::api::errors::ApiError;
use crate::api::metrics;
use crate::api::models::*;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use reviewlens_core::query;
use reviewlens_core::sentiment::SentimentAnalyzer;
use reviewlens_core::storage::ReviewStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state passed to every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ReviewStore>,
    pub analyzer: SentimentAnalyzer,
    pub prometheus_handle: PrometheusHandle,
    pub start_time: Instant,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        reviews: state.store.len(),
        wal_size_bytes: state.store.wal_size_bytes(),
    })
}

/// `GET /reviews`
///
/// With none of `location`, `start_date`, `end_date` present: every review in
/// insertion order, without sentiment. With any of them present (even blank):
/// the filtered, sentiment-ranked view, same as `/reviews/ranked`.
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(filter): Query<ReviewFilter>,
) -> Response {
    if !filter.is_empty() {
        return ranked(&state, filter).into_response();
    }

    let snapshot = state.store.snapshot();
    let reviews: Vec<ReviewResponse> = snapshot.iter().map(ReviewResponse::from).collect();
    metrics::record_query("list", reviews.len());
    Json(reviews).into_response()
}

/// `GET /reviews/ranked`
pub async fn ranked_reviews(
    State(state): State<AppState>,
    Query(filter): Query<ReviewFilter>,
) -> Json<Vec<ScoredReviewResponse>> {
    ranked(&state, filter)
}

fn ranked(state: &AppState, filter: ReviewFilter) -> Json<Vec<ScoredReviewResponse>> {
    let filter = filter.without_blanks();
    let snapshot = state.store.snapshot();
    let results: Vec<ScoredReviewResponse> = query::rank(&snapshot, &filter, &state.analyzer)
        .into_iter()
        .map(ScoredReviewResponse::from)
        .collect();
    metrics::record_query("ranked", results.len());
    tracing::debug!(
        location = ?filter.location,
        start = ?filter.start,
        end = ?filter.end,
        results = results.len(),
        "Ranked reviews"
    );
    Json(results)
}

/// `POST /reviews`
///
/// Accepts `application/json` or `application/x-www-form-urlencoded` bodies.
pub async fn create_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let req = parse_create_request(&headers, &body)?;
    let location = req.location.unwrap_or_default();
    let text = req.body.unwrap_or_default();

    let store = state.store.clone();
    let review = tokio::task::spawn_blocking(move || store.append(&location, &text))
        .await
        .map_err(|e| {
            tracing::error!("Append task failed: {}", e);
            ApiError::Internal("Write failed".into())
        })??;

    metrics::record_write_operation("create");
    tracing::info!(review_id = %review.id, location = %review.location, "Review created");
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

fn parse_create_request(headers: &HeaderMap, body: &[u8]) -> Result<CreateReviewRequest, ApiError> {
    if body.is_empty() {
        return Ok(CreateReviewRequest::default());
    }
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Malformed JSON body: {}", e)))
    } else {
        serde_urlencoded::from_bytes(body)
            .map_err(|e| ApiError::BadRequest(format!("Malformed form body: {}", e)))
    }
}

/// `POST /admin/compact`
pub async fn compact(State(state): State<AppState>) -> Result<Json<CompactResponse>, ApiError> {
    let store = state.store.clone();
    let reviews = tokio::task::spawn_blocking(move || store.compact())
        .await
        .map_err(|e| {
            tracing::error!("Compaction task failed: {}", e);
            ApiError::Internal("Compaction failed".into())
        })?
        .map_err(|e| {
            tracing::error!("Compaction failed: {}", e);
            ApiError::Internal(format!("Compaction failed: {}", e))
        })?;
    metrics::record_write_operation("compact");
    Ok(Json(CompactResponse { reviews }))
}

/// `GET /metrics`
pub async fn metrics_endpoint(State(state): State<AppState>) -> String {
    metrics::update_store_metrics(&state.store);
    state.prometheus_handle.render()
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".into())
}
