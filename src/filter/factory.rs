//! Filter factory - tag to typed filter
//!
//! The set of variants is closed: a tag that is not one of the four known
//! names is rejected with [`FilterError::UnknownFilterType`] instead of
//! falling back to some permissive default.

use super::{Filter, HierarchyFilter, RangedFilter, RangedTwoDimensionalFilter, TwoDimensionalFilter};
use crate::error::FilterError;
use crate::types::Value;
use std::fmt;
use std::str::FromStr;

/// Registered filter variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    /// `RangedFilter`
    Ranged,
    /// `TwoDimensionalFilter`
    TwoDimensional,
    /// `RangedTwoDimensionalFilter`
    RangedTwoDimensional,
    /// `HierarchyFilter`
    Hierarchy,
}

impl FilterType {
    /// All registered variants
    pub const ALL: [FilterType; 4] = [
        FilterType::Ranged,
        FilterType::TwoDimensional,
        FilterType::RangedTwoDimensional,
        FilterType::Hierarchy,
    ];

    /// Wire tag of the variant
    pub fn as_str(self) -> &'static str {
        match self {
            FilterType::Ranged => RangedFilter::FILTER_TYPE,
            FilterType::TwoDimensional => TwoDimensionalFilter::FILTER_TYPE,
            FilterType::RangedTwoDimensional => RangedTwoDimensionalFilter::FILTER_TYPE,
            FilterType::Hierarchy => HierarchyFilter::FILTER_TYPE,
        }
    }
}

impl FromStr for FilterType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FilterError::UnknownFilterType(s.to_string()))
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construct a filter of the given variant from its serialized bound values
pub fn build(filter_type: FilterType, value: &Value) -> Result<Filter, FilterError> {
    let filter = match filter_type {
        FilterType::Ranged => Filter::Ranged(RangedFilter::from_values(value)?),
        FilterType::TwoDimensional => {
            Filter::TwoDimensional(TwoDimensionalFilter::from_values(value)?)
        },
        FilterType::RangedTwoDimensional => {
            Filter::RangedTwoDimensional(RangedTwoDimensionalFilter::from_values(value)?)
        },
        FilterType::Hierarchy => Filter::Hierarchy(HierarchyFilter::from_values(value)?),
    };
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ComponentBound;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    /// Candidate values around the bounds used in the round-trip checks
    fn candidates() -> Vec<Value> {
        let mut values: Vec<Value> = (-5..=25).map(Value::from).collect();
        values.push(Value::from(9.5));
        values.push(Value::from("a"));
        values.push(Value::Null);
        for a in 0..4 {
            for b in 0..4 {
                values.push(Value::from(vec![a, b]));
            }
        }
        values.push(Value::from(vec!["fruit", "apple", "gala"]));
        values.push(Value::from(vec!["fruit", "pear"]));
        values
    }

    fn assert_round_trip(filter: Filter) {
        let rebuilt = Filter::from_serialized(
            filter.filter_type(),
            &Value::List(filter.serialize()),
        )
        .expect("round trip should rebuild the filter");
        assert_eq!(rebuilt, filter);
        for candidate in candidates() {
            assert_eq!(rebuilt.is_filtered(&candidate), filter.is_filtered(&candidate), "{}", candidate);
        }
    }

    #[test]
    fn test_parse_known_tags() {
        for t in FilterType::ALL {
            assert_eq!(t.as_str().parse::<FilterType>().unwrap(), t);
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = Filter::from_serialized("BoxFilter", &Value::from(vec![1, 2])).unwrap_err();
        assert_eq!(err, FilterError::UnknownFilterType("BoxFilter".to_string()));
        // tags are case sensitive
        assert!("rangedfilter".parse::<FilterType>().is_err());
    }

    #[test]
    fn test_round_trip_every_variant() {
        assert_round_trip(RangedFilter::new(3, 12).into());
        assert_round_trip(TwoDimensionalFilter::new(1, 2).into());
        assert_round_trip(RangedTwoDimensionalFilter::rectangle((0, 2), (1, 3)).into());
        assert_round_trip(
            RangedTwoDimensionalFilter::new(
                ComponentBound::Exact(Value::from(2)),
                ComponentBound::Any,
            )
            .into(),
        );
        assert_round_trip(HierarchyFilter::new(["fruit", "apple"]).into());
        assert_round_trip(HierarchyFilter::new(Vec::<Value>::new()).into());
    }

    #[test]
    fn test_round_trip_dates() {
        let low = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let high = Utc.with_ymd_and_hms(2023, 1, 5, 0, 0, 0).unwrap();
        let filter = Filter::from(RangedFilter::new(low, high));

        // through JSON text, the way it travels between client and server
        let text = serde_json::to_string(&filter.to_serialized()).unwrap();
        let entry: crate::filter::SerializedFilter = serde_json::from_str(&text).unwrap();
        assert_eq!(entry.to_filter().unwrap(), filter);
    }

    proptest! {
        #[test]
        fn prop_ranged_round_trip(low in -1e6..1e6f64, width in 0.0..1e6f64, x in -2e6..2e6f64) {
            let filter = Filter::from(RangedFilter::new(low, low + width));
            let rebuilt = Filter::from_serialized(filter.filter_type(), &Value::List(filter.serialize())).unwrap();
            let v = Value::from(x);
            prop_assert_eq!(rebuilt.is_filtered(&v), filter.is_filtered(&v));
            prop_assert_eq!(filter.is_filtered(&v), low <= x && x < low + width);
        }

        #[test]
        fn prop_two_dimensional_matches_only_exact_pair(a in 0i64..5, b in 0i64..5, x in 0i64..5, y in 0i64..5) {
            let filter = Filter::from(TwoDimensionalFilter::new(a, b));
            let candidate = Value::from(vec![x, y]);
            prop_assert_eq!(filter.is_filtered(&candidate), x == a && y == b);
        }

        #[test]
        fn prop_hierarchy_prefix(path in prop::collection::vec(0i64..3, 1..4), extra in prop::collection::vec(0i64..3, 0..3)) {
            let filter = Filter::from(HierarchyFilter::new(path.clone()));
            let mut full = path.clone();
            full.extend(extra);
            prop_assert!(filter.is_filtered(&Value::from(full.clone())));

            let mut diverged = full.clone();
            diverged[0] += 10;
            prop_assert!(!filter.is_filtered(&Value::from(diverged)));

            let truncated: Vec<i64> = path[..path.len() - 1].to_vec();
            prop_assert!(!filter.is_filtered(&Value::from(truncated)));
        }
    }
}
