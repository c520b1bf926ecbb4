//! Axum route handlers for the history API.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use harbor_core::ScanRecord;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    error::HistoryError,
    service::{HistoryPage, HistoryParams, HistoryService},
};

// ── Shared state ─────────────────────────────────────────────────────────────

type Service = Arc<HistoryService>;

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router around the given service.
pub fn create_router(service: Service) -> Router {
    Router::new()
        .route("/history", get(list_history))
        .route("/history/health", get(history_health))
        .route("/history/{id}", get(get_scan))
        .route("/health", get(health))
        .with_state(service)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /health`: liveness probe. Does not touch the store.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// `GET /history/health`: readiness probe polled by the dashboard.
pub async fn history_health(State(service): State<Service>) -> impl IntoResponse {
    match service.health().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))),
        Err(e) => {
            tracing::warn!(error = %e, "store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"status": "unavailable"})),
            )
        }
    }
}

/// `GET /history`: one page of scan history.
///
/// # Errors
/// Returns [`HistoryError::InvalidArgument`] for a malformed `limit`, a
/// repeated parameter other than `cursor`, or an unparsable query string, and
/// [`HistoryError::Store`] if the store fails.
pub async fn list_history(
    State(service): State<Service>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<HistoryPage>, HistoryError> {
    let Query(pairs) = query.map_err(|e| HistoryError::InvalidArgument(e.body_text()))?;
    let params = HistoryParams::from_pairs(pairs)?;
    let page = service.list(&params).await?;
    Ok(Json(page))
}

/// `GET /history/{id}`: a single scan record.
///
/// # Errors
/// Returns [`HistoryError::InvalidArgument`] if `id` is not a scan identifier,
/// [`HistoryError::NotFound`] if no scan has it.
pub async fn get_scan(
    State(service): State<Service>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<ScanRecord>, HistoryError> {
    let Path(id) = path.map_err(|e| HistoryError::InvalidArgument(e.body_text()))?;
    let record = service.get(&id).await?;
    Ok(Json(record))
}
