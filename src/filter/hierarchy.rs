//! Prefix selection over hierarchical paths (sunburst, tree maps)

use super::expect_scalar;
use crate::error::FilterError;
use crate::types::Value;
use std::fmt;

/// Selects every path that starts with `path`
///
/// An empty path matches nothing, so an unset selection never turns into
/// "everything selected".
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyFilter {
    path: Vec<Value>,
}

impl HierarchyFilter {
    /// Variant tag used on the wire
    pub const FILTER_TYPE: &'static str = "HierarchyFilter";

    /// Create a prefix filter
    pub fn new<T: Into<Value>>(path: impl IntoIterator<Item = T>) -> Self {
        Self {
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// The selected prefix
    pub fn path(&self) -> &[Value] {
        &self.path
    }

    /// Returns true iff `candidate` is a list starting with the whole path
    pub fn is_filtered(&self, candidate: &Value) -> bool {
        if self.path.is_empty() {
            return false;
        }
        match candidate.as_list() {
            Some(items) => items.len() >= self.path.len() && items.starts_with(&self.path),
            None => false,
        }
    }

    /// Bound values: the path itself
    pub fn serialize(&self) -> Vec<Value> {
        self.path.clone()
    }

    /// Rebuild from a serialized path
    pub fn from_values(value: &Value) -> Result<Self, FilterError> {
        let items = value.as_list().ok_or_else(|| {
            FilterError::malformed(
                Self::FILTER_TYPE,
                format!("expected a path list, got {}", value.kind()),
            )
        })?;
        let path = items
            .iter()
            .map(|item| expect_scalar(Self::FILTER_TYPE, item).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { path })
    }
}

impl fmt::Display for HierarchyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("/"))
    }
}
