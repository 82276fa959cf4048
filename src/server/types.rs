//! Request and response types for the HTTP API

use crate::adapter::AdapterKind;
use crate::filter::SerializedFilterSet;
use serde::{Deserialize, Serialize};

// =============================================================================
// Chart API Types
// =============================================================================

/// Chart request body
///
/// Date-shaped strings anywhere in `filters` are revived to dates while the
/// body is deserialized. A missing `filters` field is the empty set, which
/// clears every filter.
#[derive(Debug, Default, Deserialize)]
pub struct FilterRequest {
    /// Filter key to serialized filter
    #[serde(default)]
    pub filters: SerializedFilterSet,
}

/// Error body shared by all endpoints
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Error message
    pub error: String,
}

impl ErrorResponse {
    /// Failed response with a message
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Per-resource totals
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Resource name
    pub resource: String,
    /// Records passing every active filter
    pub selected: usize,
    /// Records in the dataset
    pub total: usize,
    /// Number of active filters
    pub active_filters: usize,
}

// =============================================================================
// Admin Types
// =============================================================================

/// One served resource
#[derive(Debug, Serialize)]
pub struct ResourceInfo {
    /// Resource name
    pub name: String,
    /// Adapter kind
    pub kind: AdapterKind,
}

/// Resource listing
#[derive(Debug, Serialize)]
pub struct ResourcesResponse {
    /// Resources in name order
    pub resources: Vec<ResourceInfo>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}
