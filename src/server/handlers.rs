//! HTTP handlers
//!
//! Every chart request runs restore and compute inside one adapter session
//! on the blocking pool, since the adapter lock is held for the whole
//! computation. Stats reads take the same lock and run there too.

use super::types::*;
use super::AppState;
use crate::adapter::ChartAdapter;
use crate::error::Error;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

// =============================================================================
// Health & Admin Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// List served resources
pub async fn list_resources(State(state): State<Arc<AppState>>) -> Json<ResourcesResponse> {
    let resources = state
        .adapters
        .values()
        .map(|adapter| ResourceInfo {
            name: adapter.name().to_string(),
            kind: adapter.kind(),
        })
        .collect();
    Json(ResourcesResponse { resources })
}

// =============================================================================
// Chart Handlers
// =============================================================================

fn not_found(resource: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("Unknown resource '{}'", resource))),
    )
        .into_response()
}

fn lookup(state: &AppState, resource: &str) -> Option<Arc<dyn ChartAdapter>> {
    state.adapters.get(resource).cloned()
}

/// Restore the request's filter set and return the chart data
pub async fn compute_chart(
    State(state): State<Arc<AppState>>,
    Path(resource): Path<String>,
    Json(request): Json<FilterRequest>,
) -> Response {
    let Some(adapter) = lookup(&state, &resource) else {
        warn!(resource = %resource, "Chart request for unknown resource");
        return not_found(&resource);
    };

    debug!(resource = %resource, filters = request.filters.len(), "Computing chart data");
    let result =
        tokio::task::spawn_blocking(move || adapter.restore_and_compute(&request.filters)).await;

    match result {
        Ok(Ok(chart)) => (StatusCode::OK, Json(chart)).into_response(),
        Ok(Err(e @ Error::Filter(_))) => {
            debug!(resource = %resource, error = %e, "Rejected filter set");
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))).into_response()
        },
        Ok(Err(e)) => {
            error!(resource = %resource, error = %e, "Chart computation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        },
        Err(e) => {
            error!(resource = %resource, error = %e, "Chart task panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Chart computation aborted")),
            )
                .into_response()
        },
    }
}

/// Totals of a resource under its current filters
pub async fn resource_stats(
    State(state): State<Arc<AppState>>,
    Path(resource): Path<String>,
) -> Response {
    let Some(adapter) = lookup(&state, &resource) else {
        return not_found(&resource);
    };

    // stats takes the adapter lock, which a chart request may hold
    match tokio::task::spawn_blocking(move || adapter.stats()).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(StatsResponse {
                resource,
                selected: stats.selected,
                total: stats.total,
                active_filters: stats.active_filters,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(resource = %resource, error = %e, "Stats task panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Stats computation aborted")),
            )
                .into_response()
        },
    }
}
