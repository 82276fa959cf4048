//! Dimensional adapters - chart-ready aggregates over a dimensional index
//!
//! A [`DimensionalAdapter`] owns one [`DimensionalIndex`], one chart
//! dimension and one group over it, plus the [`FilterStorage`] that binds
//! filter keys to the index's filter dimensions.
//!
//! # Sessions
//!
//! The index is shared mutable state: filters are applied in place and every
//! read depends on all of them. All work therefore happens inside an
//! [`AdapterSession`], which holds the adapter's lock from the first filter
//! restore until the last aggregate read of a request:
//!
//! ```rust,ignore
//! let mut session = adapter.session();
//! session.restore(&filters)?;
//! let rows = session.data();
//! let total = session.size();
//! // lock released here
//! ```
//!
//! Distinct adapters own distinct indices and never contend. Cloning an
//! adapter copies its index state, so clones never contend either.

pub mod remote;

pub use remote::{Layer, RemoteMultiAdapter, RemoteSimpleAdapter, StackedLayer};

use crate::error::{Error, IndexError, Result};
use crate::filter::{Filter, FilterSet, SerializedFilterSet};
use crate::filter_storage::{FilterStorage, RestoreSummary};
use crate::index::{Accessor, DimensionId, DimensionalIndex, GroupId, GroupRow, Reducer};
use crate::types::Record;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one chart-data computation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    /// Aggregate rows of the chart's group
    pub data: Vec<GroupRow>,
    /// Named series, present for multi-layer adapters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<Layer>>,
    /// Stacking offsets per layer, present for multi-layer adapters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<StackedLayer>>,
}

impl ChartData {
    /// Chart data consisting of rows only
    pub fn rows(data: Vec<GroupRow>) -> Self {
        Self {
            data,
            layers: None,
            stack: None,
        }
    }
}

/// Diagnostic totals of an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdapterStats {
    /// Records passing every active filter
    pub selected: usize,
    /// Records in the index
    pub total: usize,
    /// Number of active filters
    pub active_filters: usize,
}

/// Which remote adapter a resource is served by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Rows only
    #[default]
    Simple,
    /// Rows plus named layers
    Multi,
}

/// Server-side chart adapter seam
///
/// Implementors decide how aggregate rows are shaped for their chart; the
/// provided methods take care of running restore and reads in one session.
pub trait ChartAdapter: Send + Sync {
    /// Adapter (resource) name
    fn name(&self) -> &str;

    /// Kind of adapter
    fn kind(&self) -> AdapterKind;

    /// Underlying dimensional adapter
    fn dimensional(&self) -> &DimensionalAdapter;

    /// Shape aggregate rows into chart data
    fn shape(&self, rows: Vec<GroupRow>) -> ChartData;

    /// Compute chart data under the currently applied filters
    fn compute_chart_data(&self) -> ChartData {
        let session = self.dimensional().session();
        self.shape(session.data())
    }

    /// Restore a filter set and compute chart data in one critical section
    fn restore_and_compute(&self, filters: &SerializedFilterSet) -> Result<ChartData> {
        let mut session = self.dimensional().session();
        session.restore(filters)?;
        Ok(self.shape(session.data()))
    }

    /// Current totals
    fn stats(&self) -> AdapterStats {
        self.dimensional().session().stats()
    }
}

/// One dimensional index, one chart dimension, one group
pub struct DimensionalAdapter {
    name: String,
    index: Mutex<DimensionalIndex>,
    dimension: DimensionId,
    group: GroupId,
    storage: Mutex<FilterStorage>,
}

impl DimensionalAdapter {
    /// Start building an adapter over a dataset
    pub fn builder(name: impl Into<String>, records: impl Into<Arc<[Record]>>) -> AdapterBuilder {
        AdapterBuilder::new(name, records)
    }

    /// Adapter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chart dimension handle
    pub fn dimension(&self) -> DimensionId {
        self.dimension
    }

    /// Chart group handle
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Enter the adapter's critical section
    ///
    /// Lock order is index, then filter storage.
    pub fn session(&self) -> AdapterSession<'_> {
        let index = self.index.lock();
        let storage = self.storage.lock();
        AdapterSession {
            adapter: self,
            index,
            storage,
        }
    }

    /// Aggregate rows under the current filters
    pub fn data(&self) -> Vec<GroupRow> {
        self.session().data()
    }

    /// Rows-only chart data under the current filters
    pub fn compute_chart_data(&self) -> ChartData {
        ChartData::rows(self.data())
    }

    /// Restore a filter set and read rows in one critical section
    pub fn restore_and_compute(&self, filters: &SerializedFilterSet) -> Result<ChartData> {
        let mut session = self.session();
        session.restore(filters)?;
        Ok(ChartData::rows(session.data()))
    }

    /// Snapshot of the active filters
    pub fn filters(&self) -> FilterSet {
        self.storage.lock().filters().clone()
    }

    /// Records passing every active filter
    pub fn group_all(&self) -> usize {
        self.session().group_all()
    }

    /// Records in the index
    pub fn size(&self) -> usize {
        self.session().size()
    }
}

/// Independent handle over the same records, dimensions and group
///
/// The clone starts with the source's filters applied. Records are shared;
/// dimension state and filter storage are copied, so restores on either
/// handle never affect the other.
impl Clone for DimensionalAdapter {
    fn clone(&self) -> Self {
        let session = self.session();
        Self {
            name: self.name.clone(),
            index: Mutex::new((*session.index).clone()),
            dimension: self.dimension,
            group: self.group,
            storage: Mutex::new((*session.storage).clone()),
        }
    }
}

impl std::fmt::Debug for DimensionalAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DimensionalAdapter")
            .field("name", &self.name)
            .field("dimension", &self.dimension)
            .field("group", &self.group)
            .finish()
    }
}

/// Exclusive access to an adapter's index and filter storage
pub struct AdapterSession<'a> {
    adapter: &'a DimensionalAdapter,
    index: MutexGuard<'a, DimensionalIndex>,
    storage: MutexGuard<'a, FilterStorage>,
}

impl AdapterSession<'_> {
    /// Replace the whole filter set, all or nothing
    pub fn restore(&mut self, filters: &SerializedFilterSet) -> Result<RestoreSummary> {
        let summary = self.storage.restore(&mut self.index, filters)?;
        if !summary.skipped.is_empty() {
            debug!(
                adapter = %self.adapter.name,
                skipped = ?summary.skipped,
                "Ignored filters for keys without a dimension"
            );
        }
        Ok(summary)
    }

    /// Apply one filter; returns false if the key is unbound
    pub fn set_filter(&mut self, key: &str, filter: Filter) -> Result<bool> {
        Ok(self.storage.set(&mut self.index, key, filter)?)
    }

    /// Clear one key; returns false if the key is unbound
    pub fn clear_filter(&mut self, key: &str) -> Result<bool> {
        Ok(self.storage.clear(&mut self.index, key)?)
    }

    /// Clear every filter
    pub fn clear_all(&mut self) -> Result<()> {
        Ok(self.storage.clear_all(&mut self.index)?)
    }

    /// Active filters
    pub fn filters(&self) -> &FilterSet {
        self.storage.filters()
    }

    /// Aggregate rows of the chart group
    ///
    /// Read failures degrade to an empty result so that one broken aggregate
    /// renders as an empty chart instead of failing the whole response.
    pub fn data(&self) -> Vec<GroupRow> {
        match self.try_data() {
            Ok(rows) => rows,
            Err(e) => {
                warn!(adapter = %self.adapter.name, error = %e, "Aggregate read failed, returning empty data");
                Vec::new()
            },
        }
    }

    /// Aggregate rows, surfacing read failures
    pub fn try_data(&self) -> std::result::Result<Vec<GroupRow>, IndexError> {
        self.index.group_rows(self.adapter.group)
    }

    /// Records passing every active filter
    pub fn group_all(&self) -> usize {
        self.index.selected_count()
    }

    /// Records in the index
    pub fn size(&self) -> usize {
        self.index.size()
    }

    /// Current totals
    pub fn stats(&self) -> AdapterStats {
        AdapterStats {
            selected: self.group_all(),
            total: self.size(),
            active_filters: self.storage.len(),
        }
    }
}

/// Builder for [`DimensionalAdapter`]
pub struct AdapterBuilder {
    name: String,
    records: Arc<[Record]>,
    filter_dimensions: Vec<(String, Accessor)>,
    chart: Option<ChartDimension>,
    reducer: Reducer,
}

enum ChartDimension {
    /// Reuse the filter dimension bound to this key
    Key(String),
    /// Dedicated dimension
    Accessor(Accessor),
}

impl AdapterBuilder {
    /// Create a builder; the reducer defaults to counting records
    pub fn new(name: impl Into<String>, records: impl Into<Arc<[Record]>>) -> Self {
        Self {
            name: name.into(),
            records: records.into(),
            filter_dimensions: Vec::new(),
            chart: None,
            reducer: Reducer::Count,
        }
    }

    /// Add a filterable dimension under a filter key
    pub fn filter_dimension(mut self, key: impl Into<String>, accessor: Accessor) -> Self {
        self.filter_dimensions.push((key.into(), accessor));
        self
    }

    /// Group the chart by an existing filter dimension
    pub fn chart_on(mut self, key: impl Into<String>) -> Self {
        self.chart = Some(ChartDimension::Key(key.into()));
        self
    }

    /// Group the chart by a dedicated dimension
    pub fn chart_dimension(mut self, accessor: Accessor) -> Self {
        self.chart = Some(ChartDimension::Accessor(accessor));
        self
    }

    /// Set the group reducer
    pub fn reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = reducer;
        self
    }

    /// Build the index, dimensions and group
    pub fn build(self) -> Result<DimensionalAdapter> {
        let mut index = DimensionalIndex::new(self.records);
        let mut storage = FilterStorage::new();
        for (key, accessor) in self.filter_dimensions {
            let dimension = index.dimension(accessor);
            storage.bind(key, dimension);
        }

        let dimension = match self.chart {
            Some(ChartDimension::Key(key)) => storage.dimension_for(&key).ok_or_else(|| {
                Error::Configuration(format!(
                    "adapter '{}' charts unknown filter dimension '{}'",
                    self.name, key
                ))
            })?,
            Some(ChartDimension::Accessor(accessor)) => index.dimension(accessor),
            None => {
                return Err(Error::Configuration(format!(
                    "adapter '{}' has no chart dimension",
                    self.name
                )))
            },
        };
        let group = index.group(dimension, self.reducer)?;

        debug!(
            adapter = %self.name,
            records = index.size(),
            dimensions = index.dimension_count(),
            "Adapter built"
        );

        Ok(DimensionalAdapter {
            name: self.name,
            index: Mutex::new(index),
            dimension,
            group,
            storage: Mutex::new(storage),
        })
    }
}
