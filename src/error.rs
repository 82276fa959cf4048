//! Error types for the filter model, dimensional index and server

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Filter construction or restore error
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Dimensional index error
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Filter errors
///
/// Both variants abort an enclosing restore before any dimension is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// The `filterType` tag does not name a registered filter variant
    #[error("Unknown filter type: {0}")]
    UnknownFilterType(String),

    /// The tag is known but the bound values have the wrong arity or shape
    #[error("Malformed value for {filter_type}: {message}")]
    MalformedFilterValue {
        /// Tag of the filter being constructed
        filter_type: &'static str,
        /// Description of what was wrong with the value
        message: String,
    },
}

impl FilterError {
    /// Create a malformed value error for the given variant tag
    pub fn malformed(filter_type: &'static str, message: impl Into<String>) -> Self {
        FilterError::MalformedFilterValue {
            filter_type,
            message: message.into(),
        }
    }
}

/// Dimensional index errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// Dimension handle does not belong to this index
    #[error("Unknown dimension: {0}")]
    UnknownDimension(usize),

    /// Group handle does not belong to this index
    #[error("Unknown group: {0}")]
    UnknownGroup(usize),

    /// A reducer produced a non-finite aggregate
    #[error("Aggregate for key {key} is not finite")]
    NonFiniteAggregate {
        /// Rendered group key
        key: String,
    },
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_error_converts_to_error() {
        let err: Error = FilterError::UnknownFilterType("BoxFilter".to_string()).into();
        assert!(matches!(err, Error::Filter(_)));
        assert_eq!(err.to_string(), "Filter error: Unknown filter type: BoxFilter");
    }

    #[test]
    fn test_malformed_message() {
        let err = FilterError::malformed("RangedFilter", "expected 2 bounds, got 3");
        assert_eq!(
            err.to_string(),
            "Malformed value for RangedFilter: expected 2 bounds, got 3"
        );
    }
}
