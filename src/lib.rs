//! dimfilter - Coordinated dimensional filtering for chart dashboards
//!
//! This library provides the filter core behind linked dashboard charts:
//! - Four filter variants (ranged, two-dimensional, ranged two-dimensional,
//!   hierarchy) with a tagged wire form and a closed factory
//! - Filter storage with all-or-nothing restore of a whole filter set
//! - An in-memory dimensional index with dimensions, filters and groups
//! - Chart adapters that compute aggregate rows and named layers
//! - An axum HTTP transport reviving ISO dates in request bodies

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod error;
pub mod filter;
pub mod filter_storage;
pub mod index;
pub mod revive;
pub mod types;

/// Configuration management with TOML support
pub mod config;

/// HTTP router, handlers and request types
pub mod server;

// Re-export main types
pub use adapter::{ChartAdapter, ChartData, DimensionalAdapter, RemoteMultiAdapter, RemoteSimpleAdapter};
pub use error::{Error, FilterError, IndexError, Result};
pub use filter::{Filter, FilterType, SerializedFilter, SerializedFilterSet};
pub use filter_storage::FilterStorage;
pub use index::{Accessor, DimensionalIndex, Reducer};
pub use types::{Record, Value};
