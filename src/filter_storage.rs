//! Filter storage - the active filter set of one adapter
//!
//! Maps filter keys (one per dimension or coordinating chart) to live
//! dimensions of a [`DimensionalIndex`] and keeps track of which filter is
//! applied under each key.
//!
//! # Restore protocol
//!
//! [`FilterStorage::restore`] replaces the whole set in two phases:
//!
//! 1. Every entry is rebuilt through the filter factory and every binding
//!    is checked against the index. Any failure returns before a single
//!    dimension is touched.
//! 2. Parsed filters are applied, and every bound dimension absent from the
//!    set is cleared.
//!
//! Keys without a binding are skipped: the key space is open and clients
//! may send filters for charts this server does not host.
//!
//! Storage methods take the index by `&mut`, so callers can only reach them
//! while holding the adapter's session lock; no aggregate read can observe a
//! half-applied set.

use crate::error::{Error, IndexError};
use crate::filter::{Filter, FilterSet, SerializedFilterSet};
use crate::index::{DimensionId, DimensionalIndex};
use std::collections::BTreeMap;
use tracing::debug;

/// Outcome of a successful restore
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    /// Number of filters applied
    pub applied: usize,
    /// Number of previously filtered dimensions that were cleared
    pub cleared: usize,
    /// Keys present in the request that have no bound dimension
    pub skipped: Vec<String>,
}

/// Active filters and their dimension bindings
#[derive(Debug, Clone, Default)]
pub struct FilterStorage {
    bindings: BTreeMap<String, DimensionId>,
    filters: FilterSet,
}

impl FilterStorage {
    /// Create storage with no bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a filter key to a dimension
    pub fn bind(&mut self, key: impl Into<String>, dimension: DimensionId) {
        self.bindings.insert(key.into(), dimension);
    }

    /// All key to dimension bindings
    pub fn bindings(&self) -> &BTreeMap<String, DimensionId> {
        &self.bindings
    }

    /// Dimension bound to a key
    pub fn dimension_for(&self, key: &str) -> Option<DimensionId> {
        self.bindings.get(key).copied()
    }

    /// Currently active filters
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Active filter under a key
    pub fn get(&self, key: &str) -> Option<&Filter> {
        self.filters.get(key)
    }

    /// Returns true if a filter is active under the key
    pub fn has_filter(&self, key: &str) -> bool {
        self.filters.contains_key(key)
    }

    /// Number of active filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if no filter is active
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Wire form of the active set
    pub fn serialize(&self) -> SerializedFilterSet {
        self.filters
            .iter()
            .map(|(key, filter)| (key.clone(), filter.to_serialized()))
            .collect()
    }

    /// Replace the whole active set, all or nothing
    pub fn restore(
        &mut self,
        index: &mut DimensionalIndex,
        set: &SerializedFilterSet,
    ) -> Result<RestoreSummary, Error> {
        // Phase 1: build everything, touch nothing
        let mut staged: Vec<(String, DimensionId, Filter)> = Vec::with_capacity(set.len());
        let mut summary = RestoreSummary::default();
        for (key, entry) in set {
            let filter = entry.to_filter()?;
            match self.bindings.get(key) {
                Some(&dimension) => {
                    index.filter_of(dimension)?;
                    staged.push((key.clone(), dimension, filter));
                },
                None => {
                    debug!(key = %key, filter_type = entry.filter_type.as_str(), "Skipping filter for unbound key");
                    summary.skipped.push(key.clone());
                },
            }
        }
        for &dimension in self.bindings.values() {
            index.filter_of(dimension)?;
        }

        // Phase 2: apply
        for (key, &dimension) in &self.bindings {
            if set.contains_key(key) {
                continue;
            }
            if index.filter_of(dimension)?.is_some() {
                index.filter(dimension, None)?;
                summary.cleared += 1;
            }
        }
        self.filters.clear();
        for (key, dimension, filter) in staged {
            index.filter(dimension, Some(filter.clone()))?;
            self.filters.insert(key, filter);
            summary.applied += 1;
        }

        debug!(
            applied = summary.applied,
            cleared = summary.cleared,
            skipped = summary.skipped.len(),
            "Filter set restored"
        );
        Ok(summary)
    }

    /// Apply a single filter; returns false if the key is unbound
    pub fn set(
        &mut self,
        index: &mut DimensionalIndex,
        key: &str,
        filter: Filter,
    ) -> Result<bool, IndexError> {
        let Some(dimension) = self.dimension_for(key) else {
            return Ok(false);
        };
        index.filter(dimension, Some(filter.clone()))?;
        self.filters.insert(key.to_string(), filter);
        Ok(true)
    }

    /// Clear a single key; returns false if the key is unbound
    pub fn clear(&mut self, index: &mut DimensionalIndex, key: &str) -> Result<bool, IndexError> {
        let Some(dimension) = self.dimension_for(key) else {
            return Ok(false);
        };
        index.filter(dimension, None)?;
        self.filters.remove(key);
        Ok(true)
    }

    /// Clear every bound dimension
    pub fn clear_all(&mut self, index: &mut DimensionalIndex) -> Result<(), IndexError> {
        for &dimension in self.bindings.values() {
            index.filter(dimension, None)?;
        }
        self.filters.clear();
        Ok(())
    }
}
