//! Selections over two-component composite keys
//!
//! Heat maps and scatter plots key their dimension by `[x, y]`. A click on a
//! cell selects one exact pair; a brush selects a rectangle where either
//! axis may be left open.

use super::{expect_bounds, expect_scalar};
use crate::error::FilterError;
use crate::types::Value;
use std::fmt;

/// Exact match on a `[first, second]` key
#[derive(Debug, Clone, PartialEq)]
pub struct TwoDimensionalFilter {
    first: Value,
    second: Value,
}

impl TwoDimensionalFilter {
    /// Variant tag used on the wire
    pub const FILTER_TYPE: &'static str = "TwoDimensionalFilter";

    /// Create a filter selecting exactly `[first, second]`
    pub fn new(first: impl Into<Value>, second: impl Into<Value>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// First component of the selected pair
    pub fn first(&self) -> &Value {
        &self.first
    }

    /// Second component of the selected pair
    pub fn second(&self) -> &Value {
        &self.second
    }

    /// Returns true iff the candidate is a 2-list equal to the stored pair
    pub fn is_filtered(&self, candidate: &Value) -> bool {
        match candidate.as_list() {
            Some([a, b]) => a == &self.first && b == &self.second,
            _ => false,
        }
    }

    /// Bound values as `[first, second]`
    pub fn serialize(&self) -> Vec<Value> {
        vec![self.first.clone(), self.second.clone()]
    }

    /// Rebuild from a serialized pair
    pub fn from_values(value: &Value) -> Result<Self, FilterError> {
        let pair = expect_bounds(Self::FILTER_TYPE, value, 2)?;
        let first = expect_scalar(Self::FILTER_TYPE, &pair[0])?;
        let second = expect_scalar(Self::FILTER_TYPE, &pair[1])?;
        Ok(Self::new(first.clone(), second.clone()))
    }
}

impl fmt::Display for TwoDimensionalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.first, self.second)
    }
}

/// Restriction on one component of a two-dimensional key
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentBound {
    /// No restriction on this axis
    Any,
    /// Component must equal the value
    Exact(Value),
    /// Component must lie in `[low, high)`
    Range {
        /// Inclusive lower bound
        low: Value,
        /// Exclusive upper bound
        high: Value,
    },
}

impl ComponentBound {
    /// Returns true if the component satisfies this bound
    pub fn accepts(&self, component: &Value) -> bool {
        match self {
            ComponentBound::Any => true,
            ComponentBound::Exact(v) => component == v,
            ComponentBound::Range { low, high } => low <= component && component < high,
        }
    }

    /// Wire form: `null`, `[x]` or `[low, high]`
    pub fn serialize(&self) -> Value {
        match self {
            ComponentBound::Any => Value::Null,
            ComponentBound::Exact(v) => Value::List(vec![v.clone()]),
            ComponentBound::Range { low, high } => Value::List(vec![low.clone(), high.clone()]),
        }
    }

    fn from_value(filter_type: &'static str, value: &Value) -> Result<Self, FilterError> {
        match value {
            Value::Null => Ok(ComponentBound::Any),
            Value::List(items) => match items.as_slice() {
                [] => Ok(ComponentBound::Any),
                [exact] => Ok(ComponentBound::Exact(
                    expect_scalar(filter_type, exact)?.clone(),
                )),
                [low, high] => Ok(ComponentBound::Range {
                    low: expect_scalar(filter_type, low)?.clone(),
                    high: expect_scalar(filter_type, high)?.clone(),
                }),
                more => Err(FilterError::malformed(
                    filter_type,
                    format!("component bound has {} values, expected at most 2", more.len()),
                )),
            },
            other => Err(FilterError::malformed(
                filter_type,
                format!("component bound must be null or a list, got {}", other.kind()),
            )),
        }
    }
}

impl fmt::Display for ComponentBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentBound::Any => write!(f, "*"),
            ComponentBound::Exact(v) => write!(f, "{}", v),
            ComponentBound::Range { low, high } => write!(f, "[{} -> {})", low, high),
        }
    }
}

/// Per-axis bounds on a `[first, second]` key
#[derive(Debug, Clone, PartialEq)]
pub struct RangedTwoDimensionalFilter {
    first: ComponentBound,
    second: ComponentBound,
}

impl RangedTwoDimensionalFilter {
    /// Variant tag used on the wire
    pub const FILTER_TYPE: &'static str = "RangedTwoDimensionalFilter";

    /// Create a filter from per-axis bounds
    pub fn new(first: ComponentBound, second: ComponentBound) -> Self {
        Self { first, second }
    }

    /// Rectangle `[x0, x1) x [y0, y1)`
    pub fn rectangle(
        x: (impl Into<Value>, impl Into<Value>),
        y: (impl Into<Value>, impl Into<Value>),
    ) -> Self {
        Self::new(
            ComponentBound::Range {
                low: x.0.into(),
                high: x.1.into(),
            },
            ComponentBound::Range {
                low: y.0.into(),
                high: y.1.into(),
            },
        )
    }

    /// Bound on the first component
    pub fn first(&self) -> &ComponentBound {
        &self.first
    }

    /// Bound on the second component
    pub fn second(&self) -> &ComponentBound {
        &self.second
    }

    /// Returns true iff the candidate is a 2-list accepted on both axes
    pub fn is_filtered(&self, candidate: &Value) -> bool {
        match candidate.as_list() {
            Some([a, b]) => self.first.accepts(a) && self.second.accepts(b),
            _ => false,
        }
    }

    /// Bound values as `[firstBound, secondBound]`
    pub fn serialize(&self) -> Vec<Value> {
        vec![self.first.serialize(), self.second.serialize()]
    }

    /// Rebuild from `[[loA, hiA?], [loB, hiB?]]`
    pub fn from_values(value: &Value) -> Result<Self, FilterError> {
        let bounds = expect_bounds(Self::FILTER_TYPE, value, 2)?;
        Ok(Self::new(
            ComponentBound::from_value(Self::FILTER_TYPE, &bounds[0])?,
            ComponentBound::from_value(Self::FILTER_TYPE, &bounds[1])?,
        ))
    }
}

impl fmt::Display for RangedTwoDimensionalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: impl Into<Value>, b: impl Into<Value>) -> Value {
        Value::List(vec![a.into(), b.into()])
    }

    #[test]
    fn test_exact_pair() {
        let filter = TwoDimensionalFilter::new("red", 3);
        assert!(filter.is_filtered(&pair("red", 3)));
        assert!(!filter.is_filtered(&pair("red", 4)));
        assert!(!filter.is_filtered(&pair("blue", 3)));
    }

    #[test]
    fn test_exact_pair_requires_length_two() {
        let filter = TwoDimensionalFilter::new("red", 3);
        assert!(!filter.is_filtered(&Value::from(vec![Value::from("red")])));
        assert!(!filter.is_filtered(&Value::List(vec![
            Value::from("red"),
            Value::from(3),
            Value::from(3),
        ])));
        assert!(!filter.is_filtered(&Value::from("red")));
    }

    #[test]
    fn test_rectangle() {
        let filter = RangedTwoDimensionalFilter::rectangle((0, 10), (100, 200));
        assert!(filter.is_filtered(&pair(0, 100)));
        assert!(filter.is_filtered(&pair(9, 199)));
        assert!(!filter.is_filtered(&pair(10, 150)));
        assert!(!filter.is_filtered(&pair(5, 200)));
    }

    #[test]
    fn test_wildcard_and_exact_components() {
        let value = Value::List(vec![Value::Null, Value::from(vec!["x"])]);
        let filter = RangedTwoDimensionalFilter::from_values(&value).unwrap();
        assert_eq!(filter.first(), &ComponentBound::Any);
        assert!(filter.is_filtered(&pair(-1e9, "x")));
        assert!(filter.is_filtered(&pair("anything", "x")));
        assert!(!filter.is_filtered(&pair(1, "y")));
    }

    #[test]
    fn test_ranged_serialize_shape() {
        let filter = RangedTwoDimensionalFilter::new(
            ComponentBound::Range {
                low: Value::from(1),
                high: Value::from(2),
            },
            ComponentBound::Any,
        );
        assert_eq!(
            filter.serialize(),
            vec![Value::from(vec![1, 2]), Value::Null]
        );
    }

    #[test]
    fn test_ranged_rejects_flat_pair() {
        // a flat pair is an exact key, not a rectangle
        let err = RangedTwoDimensionalFilter::from_values(&Value::from(vec![10, 20])).unwrap_err();
        assert!(matches!(err, FilterError::MalformedFilterValue { .. }));

        let mixed = Value::List(vec![Value::from(vec![10]), Value::from("x")]);
        assert!(RangedTwoDimensionalFilter::from_values(&mixed).is_err());

        let nested = Value::List(vec![Value::from(vec![10]), Value::from(vec![20, 30])]);
        let filter = RangedTwoDimensionalFilter::from_values(&nested).unwrap();
        assert_eq!(filter.first(), &ComponentBound::Exact(Value::from(10)));
    }

    #[test]
    fn test_ranged_rejects_long_component() {
        let value = Value::List(vec![Value::from(vec![1, 2, 3]), Value::Null]);
        assert!(matches!(
            RangedTwoDimensionalFilter::from_values(&value),
            Err(FilterError::MalformedFilterValue { .. })
        ));
    }
}
