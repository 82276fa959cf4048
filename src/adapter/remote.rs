//! Server-resident adapters
//!
//! `RemoteSimpleAdapter` answers one chart resource with its aggregate rows.
//! `RemoteMultiAdapter` serves multi-series charts over the same aggregate:
//! each row becomes a named layer, so the client knows which series exist
//! and can key rendering state off the layer name.

use super::{AdapterKind, ChartAdapter, ChartData, DimensionalAdapter};
use crate::index::GroupRow;
use crate::types::Value;
use serde::Serialize;

/// Descriptor of one named series
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Layer {
    /// Stable series name, derived from the row key
    pub name: String,
}

/// Stacking position of one layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedLayer {
    /// Layer name
    pub name: String,
    /// Layer value
    pub value: f64,
    /// Sum of the values of all preceding layers
    pub y0: f64,
}

/// Series name for a row key
///
/// The key's JSON text, so keys of different kinds never share a name:
/// the number `1` is `1` and the text `"1"` is `"1"`.
pub fn layer_name(key: &Value) -> String {
    serde_json::to_string(key).unwrap_or_else(|_| key.to_string())
}

/// Layer descriptors for aggregate rows
pub fn layers_of(rows: &[GroupRow]) -> Vec<Layer> {
    rows.iter()
        .map(|row| Layer {
            name: layer_name(&row.key),
        })
        .collect()
}

/// Stack rows on top of each other in key order
pub fn stack_of(rows: &[GroupRow]) -> Vec<StackedLayer> {
    let mut y0 = 0.0;
    rows.iter()
        .map(|row| {
            let layer = StackedLayer {
                name: layer_name(&row.key),
                value: row.value,
                y0,
            };
            y0 += row.value;
            layer
        })
        .collect()
}

/// Remote adapter returning aggregate rows only
#[derive(Debug, Clone)]
pub struct RemoteSimpleAdapter {
    inner: DimensionalAdapter,
}

impl RemoteSimpleAdapter {
    /// Wrap a dimensional adapter
    pub fn new(inner: DimensionalAdapter) -> Self {
        Self { inner }
    }

    /// Aggregate rows under the current filters
    pub fn data(&self) -> Vec<GroupRow> {
        self.inner.data()
    }
}

impl ChartAdapter for RemoteSimpleAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Simple
    }

    fn dimensional(&self) -> &DimensionalAdapter {
        &self.inner
    }

    fn shape(&self, rows: Vec<GroupRow>) -> ChartData {
        ChartData::rows(rows)
    }
}

/// Remote adapter exposing each aggregate row as a named layer
#[derive(Debug, Clone)]
pub struct RemoteMultiAdapter {
    inner: RemoteSimpleAdapter,
}

impl RemoteMultiAdapter {
    /// Wrap a dimensional adapter
    pub fn new(inner: DimensionalAdapter) -> Self {
        Self {
            inner: RemoteSimpleAdapter::new(inner),
        }
    }

    /// Aggregate rows under the current filters
    pub fn data(&self) -> Vec<GroupRow> {
        self.inner.data()
    }

    /// One layer descriptor per row of [`data`](Self::data)
    pub fn layers(&self) -> Vec<Layer> {
        layers_of(&self.data())
    }
}

impl ChartAdapter for RemoteMultiAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Multi
    }

    fn dimensional(&self) -> &DimensionalAdapter {
        self.inner.dimensional()
    }

    fn shape(&self, rows: Vec<GroupRow>) -> ChartData {
        let layers = layers_of(&rows);
        let stack = stack_of(&rows);
        ChartData {
            data: rows,
            layers: Some(layers),
            stack: Some(stack),
        }
    }
}
