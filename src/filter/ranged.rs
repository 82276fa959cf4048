//! Half-open range selection over a continuous dimension

use super::{expect_bounds, expect_scalar};
use crate::error::FilterError;
use crate::types::Value;
use std::fmt;

/// Selects values in `[low, high)`
///
/// Used for numeric and time dimensions (brush selections on a bar or line
/// chart). `low` is included and `high` is excluded so that adjacent bins
/// never both claim a boundary value.
#[derive(Debug, Clone, PartialEq)]
pub struct RangedFilter {
    low: Value,
    high: Value,
}

impl RangedFilter {
    /// Variant tag used on the wire
    pub const FILTER_TYPE: &'static str = "RangedFilter";

    /// Create a range filter
    pub fn new(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self {
            low: low.into(),
            high: high.into(),
        }
    }

    /// Inclusive lower bound
    pub fn low(&self) -> &Value {
        &self.low
    }

    /// Exclusive upper bound
    pub fn high(&self) -> &Value {
        &self.high
    }

    /// Returns true iff `low <= candidate < high`
    pub fn is_filtered(&self, candidate: &Value) -> bool {
        &self.low <= candidate && candidate < &self.high
    }

    /// Bound values as `[low, high]`
    pub fn serialize(&self) -> Vec<Value> {
        vec![self.low.clone(), self.high.clone()]
    }

    /// Rebuild from serialized bounds
    pub fn from_values(value: &Value) -> Result<Self, FilterError> {
        let bounds = expect_bounds(Self::FILTER_TYPE, value, 2)?;
        let low = expect_scalar(Self::FILTER_TYPE, &bounds[0])?;
        let high = expect_scalar(Self::FILTER_TYPE, &bounds[1])?;
        Ok(Self::new(low.clone(), high.clone()))
    }
}

impl fmt::Display for RangedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} -> {})", self.low, self.high)
    }
}
