//! HTTP transport for chart adapters
//!
//! # Endpoints
//!
//! - `POST /api/:resource` - Restore a filter set and return chart data
//! - `GET /api/:resource/stats` - Selected and total record counts
//! - `GET /api/resources` - Served resources
//! - `GET /health` - Health check

pub mod handlers;
pub mod types;

use crate::adapter::ChartAdapter;
use crate::config::Config;
use crate::error::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state
pub struct AppState {
    /// Adapters by resource name
    pub adapters: BTreeMap<String, Arc<dyn ChartAdapter>>,
    /// CORS allowed origins (empty = allow all origins)
    pub cors_allowed_origins: Vec<String>,
}

impl AppState {
    /// State serving the given adapters
    pub fn new(adapters: impl IntoIterator<Item = Arc<dyn ChartAdapter>>) -> Self {
        Self {
            adapters: adapters
                .into_iter()
                .map(|adapter| (adapter.name().to_string(), adapter))
                .collect(),
            cors_allowed_origins: Vec::new(),
        }
    }

    /// Load the dataset and build every configured resource
    pub fn from_config(config: &Config) -> Result<Self> {
        let records = config.load_records()?;
        info!(
            path = %config.dataset.path.display(),
            records = records.len(),
            "Dataset loaded"
        );
        let adapters = config.build_adapters(records.into())?;
        let mut state = Self::new(adapters);
        state.cors_allowed_origins = config.server.cors_allowed_origins.clone();
        Ok(state)
    }
}

// =============================================================================
// Router
// =============================================================================

/// Build CORS layer from configuration
fn build_cors_layer(cors_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    if cors_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(origins)
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/resources", get(handlers::list_resources))
        .route("/api/:resource", post(handlers::compute_chart))
        .route("/api/:resource/stats", get(handlers::resource_stats))
        .with_state(state.clone())
        .layer(build_cors_layer(&state.cors_allowed_origins))
}
