//! In-memory dimensional index
//!
//! Holds the dataset and answers grouped aggregate reads under the current
//! set of dimension filters. The shape of the API mirrors the classic
//! crossfilter primitives consumed by the adapters:
//!
//! - `dimension(accessor)` derives a dimension from every record
//! - `filter(dimension, Some(filter) | None)` restricts or clears it
//! - `group(dimension, reducer)` aggregates selected records by key
//! - `group_rows`, `group_all_value`, `size` read results back
//!
//! A record is selected when every filtered dimension accepts the record's
//! value on that dimension. Groups observe all filters, including the one
//! on their own dimension, and only emit keys that have at least one
//! selected record.
//!
//! The index itself is not synchronized; adapters keep it behind a mutex
//! so that a restore and the reads that follow it happen in one critical
//! section.

use crate::error::IndexError;
use crate::filter::Filter;
use crate::types::{Record, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Extracts a dimension value from a record
#[derive(Clone)]
pub struct Accessor {
    description: String,
    extract: Arc<dyn Fn(&Record) -> Value + Send + Sync>,
}

impl Accessor {
    /// Arbitrary accessor function
    pub fn new(
        description: impl Into<String>,
        extract: impl Fn(&Record) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            extract: Arc::new(extract),
        }
    }

    /// Value of a single field (`Null` when missing)
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        let description = name.clone();
        Self::new(description, move |record: &Record| {
            record.get(&name).cloned().unwrap_or(Value::Null)
        })
    }

    /// Fixed-length list of several fields, e.g. `[x, y]` for a heat map
    pub fn fields<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let description = format!("[{}]", names.join(", "));
        Self::new(description, move |record: &Record| {
            Value::List(
                names
                    .iter()
                    .map(|n| record.get(n).cloned().unwrap_or(Value::Null))
                    .collect(),
            )
        })
    }

    /// Hierarchy path built from several fields, truncated at the first
    /// missing or null level
    pub fn path<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let description = names.join("/");
        Self::new(description, move |record: &Record| {
            Value::List(
                names
                    .iter()
                    .map_while(|n| record.get(n).filter(|v| !v.is_null()).cloned())
                    .collect(),
            )
        })
    }

    /// Apply the accessor to a record
    pub fn get(&self, record: &Record) -> Value {
        (self.extract)(record)
    }

    /// Human-readable description, used in logs
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Accessor").field(&self.description).finish()
    }
}

/// How a group combines the records that fall under one key
#[derive(Debug, Clone)]
pub enum Reducer {
    /// Number of records
    Count,
    /// Sum of a numeric accessor; non-numeric values count as zero
    Sum(Accessor),
}

impl Reducer {
    fn add(&self, acc: f64, record: &Record) -> f64 {
        match self {
            Reducer::Count => acc + 1.0,
            Reducer::Sum(accessor) => acc + accessor.get(record).as_f64().unwrap_or(0.0),
        }
    }
}

/// Handle to a dimension of one index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimensionId(usize);

/// Handle to a group of one index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

/// One aggregate row: a group key and its reduced value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    /// Dimension value shared by the records in this row
    pub key: Value,
    /// Reduced value
    pub value: f64,
}

#[derive(Clone)]
struct Dimension {
    accessor: Accessor,
    /// Accessor output per record, computed once
    values: Vec<Value>,
    filter: Option<Filter>,
}

#[derive(Clone)]
struct Group {
    dimension: DimensionId,
    reducer: Reducer,
}

/// Records plus the dimensions, filters and groups defined over them
///
/// Cloning shares the records and copies dimension and filter state.
#[derive(Clone)]
pub struct DimensionalIndex {
    records: Arc<[Record]>,
    dimensions: Vec<Dimension>,
    groups: Vec<Group>,
}

impl DimensionalIndex {
    /// Create an index over a dataset
    pub fn new(records: impl Into<Arc<[Record]>>) -> Self {
        Self {
            records: records.into(),
            dimensions: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Shared handle to the underlying records
    pub fn records(&self) -> &Arc<[Record]> {
        &self.records
    }

    /// Total number of records
    pub fn size(&self) -> usize {
        self.records.len()
    }

    /// Number of dimensions defined so far
    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Define a new dimension
    pub fn dimension(&mut self, accessor: Accessor) -> DimensionId {
        let values = self.records.iter().map(|r| accessor.get(r)).collect();
        self.dimensions.push(Dimension {
            accessor,
            values,
            filter: None,
        });
        DimensionId(self.dimensions.len() - 1)
    }

    /// Accessor a dimension was defined with
    pub fn accessor(&self, dimension: DimensionId) -> Result<&Accessor, IndexError> {
        Ok(&self.dim(dimension)?.accessor)
    }

    /// Restrict a dimension to a filter, or clear it with `None`
    pub fn filter(
        &mut self,
        dimension: DimensionId,
        filter: Option<Filter>,
    ) -> Result<(), IndexError> {
        let dim = self
            .dimensions
            .get_mut(dimension.0)
            .ok_or(IndexError::UnknownDimension(dimension.0))?;
        dim.filter = filter;
        Ok(())
    }

    /// Current restriction on a dimension
    pub fn filter_of(&self, dimension: DimensionId) -> Result<Option<&Filter>, IndexError> {
        Ok(self.dim(dimension)?.filter.as_ref())
    }

    /// Clear every dimension's restriction
    pub fn clear_filters(&mut self) {
        for dim in &mut self.dimensions {
            dim.filter = None;
        }
    }

    /// Define a group over a dimension
    pub fn group(&mut self, dimension: DimensionId, reducer: Reducer) -> Result<GroupId, IndexError> {
        self.dim(dimension)?;
        self.groups.push(Group { dimension, reducer });
        Ok(GroupId(self.groups.len() - 1))
    }

    /// Number of records passing every active filter
    pub fn selected_count(&self) -> usize {
        (0..self.records.len()).filter(|&i| self.is_selected(i)).count()
    }

    /// Aggregate rows of a group under the current filters, ordered by key
    pub fn group_rows(&self, group: GroupId) -> Result<Vec<GroupRow>, IndexError> {
        let group = self
            .groups
            .get(group.0)
            .ok_or(IndexError::UnknownGroup(group.0))?;
        let dim = self.dim(group.dimension)?;

        let mut buckets: BTreeMap<&Value, f64> = BTreeMap::new();
        for (i, record) in self.records.iter().enumerate() {
            if !self.is_selected(i) {
                continue;
            }
            let acc = buckets.entry(&dim.values[i]).or_insert(0.0);
            *acc = group.reducer.add(*acc, record);
        }

        buckets
            .into_iter()
            .map(|(key, value)| {
                if value.is_finite() {
                    Ok(GroupRow {
                        key: key.clone(),
                        value,
                    })
                } else {
                    Err(IndexError::NonFiniteAggregate {
                        key: key.to_string(),
                    })
                }
            })
            .collect()
    }

    /// Reduce every selected record into a single value
    pub fn group_all_value(&self, reducer: &Reducer) -> f64 {
        self.records
            .iter()
            .enumerate()
            .filter(|(i, _)| self.is_selected(*i))
            .fold(0.0, |acc, (_, record)| reducer.add(acc, record))
    }

    fn dim(&self, dimension: DimensionId) -> Result<&Dimension, IndexError> {
        self.dimensions
            .get(dimension.0)
            .ok_or(IndexError::UnknownDimension(dimension.0))
    }

    fn is_selected(&self, record: usize) -> bool {
        self.dimensions.iter().all(|dim| match &dim.filter {
            Some(filter) => filter.is_filtered(&dim.values[record]),
            None => true,
        })
    }
}

impl fmt::Debug for DimensionalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DimensionalIndex")
            .field("records", &self.records.len())
            .field("dimensions", &self.dimensions.len())
            .field("groups", &self.groups.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{HierarchyFilter, RangedFilter};

    fn record(category: &str, amount: i64) -> Record {
        let mut r = Record::new();
        r.insert("category".to_string(), Value::from(category));
        r.insert("amount".to_string(), Value::from(amount));
        r
    }

    fn sample() -> DimensionalIndex {
        DimensionalIndex::new(vec![
            record("a", 5),
            record("a", 15),
            record("b", 12),
            record("c", 25),
        ])
    }

    #[test]
    fn test_group_count_without_filters() {
        let mut index = sample();
        let category = index.dimension(Accessor::field("category"));
        let group = index.group(category, Reducer::Count).unwrap();

        let rows = index.group_rows(group).unwrap();
        assert_eq!(
            rows,
            vec![
                GroupRow { key: Value::from("a"), value: 2.0 },
                GroupRow { key: Value::from("b"), value: 1.0 },
                GroupRow { key: Value::from("c"), value: 1.0 },
            ]
        );
        assert_eq!(index.selected_count(), 4);
        assert_eq!(index.size(), 4);
    }

    #[test]
    fn test_filter_on_other_dimension_restricts_group() {
        let mut index = sample();
        let category = index.dimension(Accessor::field("category"));
        let amount = index.dimension(Accessor::field("amount"));
        let group = index
            .group(category, Reducer::Sum(Accessor::field("amount")))
            .unwrap();

        index
            .filter(amount, Some(RangedFilter::new(10, 20).into()))
            .unwrap();

        let rows = index.group_rows(group).unwrap();
        assert_eq!(
            rows,
            vec![
                GroupRow { key: Value::from("a"), value: 15.0 },
                GroupRow { key: Value::from("b"), value: 12.0 },
            ]
        );
        assert_eq!(index.selected_count(), 2);
        assert_eq!(index.group_all_value(&Reducer::Count), 2.0);
    }

    #[test]
    fn test_group_observes_own_dimension_filter() {
        let mut index = sample();
        let amount = index.dimension(Accessor::field("amount"));
        let group = index.group(amount, Reducer::Count).unwrap();
        index
            .filter(amount, Some(RangedFilter::new(10, 20).into()))
            .unwrap();

        let keys: Vec<Value> = index.group_rows(group).unwrap().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![Value::from(12), Value::from(15)]);
    }

    #[test]
    fn test_clearing_filter_restores_everything() {
        let mut index = sample();
        let amount = index.dimension(Accessor::field("amount"));
        index
            .filter(amount, Some(RangedFilter::new(0, 1).into()))
            .unwrap();
        assert_eq!(index.selected_count(), 0);
        assert!(index.filter_of(amount).unwrap().is_some());

        index.filter(amount, None).unwrap();
        assert_eq!(index.selected_count(), 4);
        assert!(index.filter_of(amount).unwrap().is_none());
    }

    #[test]
    fn test_unknown_handles() {
        let mut index = sample();
        assert_eq!(
            index.filter(DimensionId(7), None),
            Err(IndexError::UnknownDimension(7))
        );
        assert_eq!(index.group_rows(GroupId(3)), Err(IndexError::UnknownGroup(3)));
        assert!(index.group(DimensionId(1), Reducer::Count).is_err());
    }

    #[test]
    fn test_non_finite_sum_is_an_error() {
        let mut big = Record::new();
        big.insert("k".to_string(), Value::from("x"));
        big.insert("v".to_string(), Value::from(1e308));
        let mut index = DimensionalIndex::new(vec![big.clone(), big]);
        let k = index.dimension(Accessor::field("k"));
        let group = index.group(k, Reducer::Sum(Accessor::field("v"))).unwrap();

        assert!(matches!(
            index.group_rows(group),
            Err(IndexError::NonFiniteAggregate { .. })
        ));
    }

    #[test]
    fn test_path_accessor_stops_at_missing_level() {
        let mut r = Record::new();
        r.insert("l1".to_string(), Value::from("fruit"));
        r.insert("l3".to_string(), Value::from("gala"));
        let accessor = Accessor::path(["l1", "l2", "l3"]);
        assert_eq!(accessor.get(&r), Value::from(vec!["fruit"]));
        assert!(HierarchyFilter::new(["fruit"]).is_filtered(&accessor.get(&r)));
    }

    #[test]
    fn test_fields_accessor_builds_pairs() {
        let r = record("a", 5);
        let accessor = Accessor::fields(["category", "amount"]);
        assert_eq!(
            accessor.get(&r),
            Value::List(vec![Value::from("a"), Value::from(5)])
        );
        assert_eq!(accessor.description(), "[category, amount]");
    }
}
