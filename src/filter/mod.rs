//! Filter model - immutable selection predicates
//!
//! A filter describes which values of one dimension are currently selected.
//! Filters are plain immutable values: changing a selection means building a
//! new filter, so every chart holding a reference keeps seeing the selection
//! it was given.
//!
//! # Variants
//!
//! | Tag                          | Selects                                  |
//! |------------------------------|------------------------------------------|
//! | `RangedFilter`               | `low <= v < high`                        |
//! | `TwoDimensionalFilter`       | `v == [a, b]`                            |
//! | `RangedTwoDimensionalFilter` | per-axis exact/range/wildcard on `[a, b]`|
//! | `HierarchyFilter`            | `v` starts with `path`                   |
//!
//! # Wire format
//!
//! ```json
//! { "filterType": "RangedFilter", "value": [10, 20] }
//! ```
//!
//! `value` is exactly what [`Filter::serialize`] returns; [`factory`] turns a
//! tagged entry back into a [`Filter`].

pub mod factory;
pub mod hierarchy;
pub mod ranged;
pub mod two_dimensional;

pub use factory::FilterType;
pub use hierarchy::HierarchyFilter;
pub use ranged::RangedFilter;
pub use two_dimensional::{ComponentBound, RangedTwoDimensionalFilter, TwoDimensionalFilter};

use crate::error::FilterError;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Active filters keyed by dimension key
pub type FilterSet = BTreeMap<String, Filter>;

/// Wire form of a filter set
pub type SerializedFilterSet = BTreeMap<String, SerializedFilter>;

/// A selection predicate over one dimension
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Half-open range
    Ranged(RangedFilter),
    /// Exact two-component key
    TwoDimensional(TwoDimensionalFilter),
    /// Per-axis bounds on a two-component key
    RangedTwoDimensional(RangedTwoDimensionalFilter),
    /// Path prefix
    Hierarchy(HierarchyFilter),
}

impl Filter {
    /// Variant of this filter
    pub fn kind(&self) -> FilterType {
        match self {
            Filter::Ranged(_) => FilterType::Ranged,
            Filter::TwoDimensional(_) => FilterType::TwoDimensional,
            Filter::RangedTwoDimensional(_) => FilterType::RangedTwoDimensional,
            Filter::Hierarchy(_) => FilterType::Hierarchy,
        }
    }

    /// Stable wire tag of this filter's variant
    pub fn filter_type(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Returns true if `candidate` is selected by this filter
    pub fn is_filtered(&self, candidate: &Value) -> bool {
        match self {
            Filter::Ranged(f) => f.is_filtered(candidate),
            Filter::TwoDimensional(f) => f.is_filtered(candidate),
            Filter::RangedTwoDimensional(f) => f.is_filtered(candidate),
            Filter::Hierarchy(f) => f.is_filtered(candidate),
        }
    }

    /// Bound values as a plain ordered sequence
    pub fn serialize(&self) -> Vec<Value> {
        match self {
            Filter::Ranged(f) => f.serialize(),
            Filter::TwoDimensional(f) => f.serialize(),
            Filter::RangedTwoDimensional(f) => f.serialize(),
            Filter::Hierarchy(f) => f.serialize(),
        }
    }

    /// Tagged wire entry for this filter
    pub fn to_serialized(&self) -> SerializedFilter {
        SerializedFilter {
            filter_type: self.filter_type().to_string(),
            value: Value::List(self.serialize()),
        }
    }

    /// Rebuild a filter from its tag and serialized bound values
    pub fn from_serialized(filter_type: &str, value: &Value) -> Result<Self, FilterError> {
        factory::build(filter_type.parse()?, value)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Ranged(inner) => write!(f, "{}", inner),
            Filter::TwoDimensional(inner) => write!(f, "{}", inner),
            Filter::RangedTwoDimensional(inner) => write!(f, "{}", inner),
            Filter::Hierarchy(inner) => write!(f, "{}", inner),
        }
    }
}

impl From<RangedFilter> for Filter {
    fn from(f: RangedFilter) -> Self {
        Filter::Ranged(f)
    }
}

impl From<TwoDimensionalFilter> for Filter {
    fn from(f: TwoDimensionalFilter) -> Self {
        Filter::TwoDimensional(f)
    }
}

impl From<RangedTwoDimensionalFilter> for Filter {
    fn from(f: RangedTwoDimensionalFilter) -> Self {
        Filter::RangedTwoDimensional(f)
    }
}

impl From<HierarchyFilter> for Filter {
    fn from(f: HierarchyFilter) -> Self {
        Filter::Hierarchy(f)
    }
}

/// Tagged filter entry as it travels over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedFilter {
    /// Variant tag
    #[serde(rename = "filterType")]
    pub filter_type: String,
    /// Serialized bound values
    #[serde(default)]
    pub value: Value,
}

impl SerializedFilter {
    /// Create an entry from a tag and bound values
    pub fn new(filter_type: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter_type: filter_type.into(),
            value: value.into(),
        }
    }

    /// Reconstruct the typed filter
    pub fn to_filter(&self) -> Result<Filter, FilterError> {
        Filter::from_serialized(&self.filter_type, &self.value)
    }
}

impl From<&Filter> for SerializedFilter {
    fn from(filter: &Filter) -> Self {
        filter.to_serialized()
    }
}

/// Check that `value` is a list of exactly `arity` elements
pub(crate) fn expect_bounds<'a>(
    filter_type: &'static str,
    value: &'a Value,
    arity: usize,
) -> Result<&'a [Value], FilterError> {
    let items = value.as_list().ok_or_else(|| {
        FilterError::malformed(
            filter_type,
            format!("expected a list of {} values, got {}", arity, value.kind()),
        )
    })?;
    if items.len() != arity {
        return Err(FilterError::malformed(
            filter_type,
            format!("expected {} values, got {}", arity, items.len()),
        ));
    }
    Ok(items)
}

/// Check that a bound value is a plain scalar (not null, list or map)
pub(crate) fn expect_scalar<'a>(
    filter_type: &'static str,
    value: &'a Value,
) -> Result<&'a Value, FilterError> {
    match value {
        Value::Null | Value::List(_) | Value::Map(_) => Err(FilterError::malformed(
            filter_type,
            format!("bound must be a scalar, got {}", value.kind()),
        )),
        scalar => Ok(scalar),
    }
}
