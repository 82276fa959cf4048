//! Configuration management for dimfilter
//!
//! TOML configuration with environment variable overrides and sensible
//! defaults. Besides server settings, the configuration declares the dataset,
//! the filterable dimensions clients may send filters for, and the chart
//! resources served under `POST /api/<resource>`.
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [dataset]
//! path = "data/sales.json"
//!
//! [[dimensions]]
//! key = "date"
//! fields = ["date"]
//!
//! [[dimensions]]
//! key = "category"
//! fields = ["department", "aisle", "product"]
//! shape = "path"
//!
//! [[resources]]
//! name = "sales_by_region"
//! kind = "multi"
//! chart_fields = ["region"]
//! reduce = { sum = "amount" }
//! ```

use crate::adapter::{AdapterKind, ChartAdapter, DimensionalAdapter, RemoteMultiAdapter, RemoteSimpleAdapter};
use crate::error::{Error, Result};
use crate::index::{Accessor, Reducer};
use crate::types::{Record, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Dataset location
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Filterable dimensions, one per filter key
    #[serde(default)]
    pub dimensions: Vec<DimensionConfig>,

    /// Chart resources
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// CORS allowed origins (empty = allow all origins)
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// Dataset configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    /// JSON file holding an array of records
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

/// How a dimension's fields are combined into a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DimensionShape {
    /// Single field value
    #[default]
    Field,
    /// Fixed-length list of field values (two-dimensional filters)
    Tuple,
    /// Hierarchy path, truncated at the first missing level
    Path,
}

/// A filterable dimension
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DimensionConfig {
    /// Filter key clients use for this dimension
    pub key: String,

    /// Record fields the dimension reads
    pub fields: Vec<String>,

    /// How the fields are combined
    #[serde(default)]
    pub shape: DimensionShape,
}

/// Group reducer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReduceConfig {
    /// Count records
    #[default]
    Count,
    /// Sum a numeric field
    Sum(String),
}

/// A chart resource
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceConfig {
    /// Resource name, served at `/api/<name>`
    pub name: String,

    /// Adapter kind
    #[serde(default)]
    pub kind: AdapterKind,

    /// Group by the filter dimension with this key
    #[serde(default)]
    pub chart_on: Option<String>,

    /// Group by a dedicated dimension over these fields
    #[serde(default)]
    pub chart_fields: Vec<String>,

    /// Shape of the dedicated chart dimension
    #[serde(default)]
    pub chart_shape: DimensionShape,

    /// Group reducer
    #[serde(default)]
    pub reduce: ReduceConfig,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_data_path() -> PathBuf {
    PathBuf::from("data/records.json")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

impl DimensionShape {
    /// Build the accessor for a list of fields
    pub fn accessor(self, fields: &[String]) -> Accessor {
        match self {
            DimensionShape::Field => Accessor::field(fields.first().cloned().unwrap_or_default()),
            DimensionShape::Tuple => Accessor::fields(fields.to_vec()),
            DimensionShape::Path => Accessor::path(fields.to_vec()),
        }
    }

    fn check_fields(self, owner: &str, fields: &[String]) -> Result<()> {
        if fields.is_empty() {
            return Err(Error::Configuration(format!("{} has no fields", owner)));
        }
        if self == DimensionShape::Field && fields.len() != 1 {
            return Err(Error::Configuration(format!(
                "{} has shape 'field' but {} fields",
                owner,
                fields.len()
            )));
        }
        Ok(())
    }
}

impl DimensionConfig {
    /// Accessor for this dimension
    pub fn accessor(&self) -> Accessor {
        self.shape.accessor(&self.fields)
    }
}

impl ReduceConfig {
    /// Reducer for this configuration
    pub fn reducer(&self) -> Reducer {
        match self {
            ReduceConfig::Count => Reducer::Count,
            ReduceConfig::Sum(field) => Reducer::Sum(Accessor::field(field.clone())),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
            .map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("DIMFILTER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("DIMFILTER_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(path) = std::env::var("DIMFILTER_DATA_FILE") {
            self.dataset.path = PathBuf::from(path);
        }
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            self.server.log_level = log_level;
        }
    }

    /// Override host and port from a `host:port` listen address
    pub fn apply_listen_override(&mut self, listen: &str) -> Result<()> {
        let invalid = || Error::Configuration(format!("Invalid listen address '{}'", listen));
        let (host, port) = listen.rsplit_once(':').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        self.server.port = port.parse().map_err(|_| invalid())?;
        self.server.host = host.to_string();
        Ok(())
    }

    /// Listen address as `host:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Configuration("Server port cannot be 0".to_string()));
        }
        if self.dataset.path.as_os_str().is_empty() {
            return Err(Error::Configuration("Dataset path cannot be empty".to_string()));
        }

        let mut keys = HashSet::new();
        for dim in &self.dimensions {
            if !keys.insert(dim.key.as_str()) {
                return Err(Error::Configuration(format!(
                    "Duplicate dimension key '{}'",
                    dim.key
                )));
            }
            dim.shape
                .check_fields(&format!("dimension '{}'", dim.key), &dim.fields)?;
        }

        let mut names = HashSet::new();
        for res in &self.resources {
            if res.name.is_empty() || res.name.contains('/') || res.name == "resources" {
                return Err(Error::Configuration(format!(
                    "Invalid resource name '{}'",
                    res.name
                )));
            }
            if !names.insert(res.name.as_str()) {
                return Err(Error::Configuration(format!(
                    "Duplicate resource '{}'",
                    res.name
                )));
            }
            match &res.chart_on {
                Some(key) if !keys.contains(key.as_str()) => {
                    return Err(Error::Configuration(format!(
                        "Resource '{}' charts unknown dimension '{}'",
                        res.name, key
                    )));
                },
                Some(_) => {},
                None => res
                    .chart_shape
                    .check_fields(&format!("resource '{}'", res.name), &res.chart_fields)?,
            }
        }

        Ok(())
    }

    /// Save configuration to TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Read the dataset, reviving date strings
    pub fn load_records(&self) -> Result<Vec<Record>> {
        let text = std::fs::read_to_string(&self.dataset.path)?;
        parse_records(&text)
    }

    /// Build one chart adapter per resource over the same records
    pub fn build_adapters(&self, records: Arc<[Record]>) -> Result<Vec<Arc<dyn ChartAdapter>>> {
        self.resources
            .iter()
            .map(|res| {
                let mut builder = DimensionalAdapter::builder(res.name.clone(), Arc::clone(&records));
                for dim in &self.dimensions {
                    builder = builder.filter_dimension(dim.key.clone(), dim.accessor());
                }
                builder = match &res.chart_on {
                    Some(key) => builder.chart_on(key.clone()),
                    None => builder.chart_dimension(res.chart_shape.accessor(&res.chart_fields)),
                };
                let adapter = builder.reducer(res.reduce.reducer()).build()?;
                let adapter: Arc<dyn ChartAdapter> = match res.kind {
                    AdapterKind::Simple => Arc::new(RemoteSimpleAdapter::new(adapter)),
                    AdapterKind::Multi => Arc::new(RemoteMultiAdapter::new(adapter)),
                };
                Ok(adapter)
            })
            .collect()
    }
}

/// Parse a JSON array of objects into records
pub fn parse_records(text: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(text)?;
    let items = match value {
        Value::List(items) => items,
        other => {
            return Err(Error::Serialization(format!(
                "dataset must be a JSON array, got {}",
                other.kind()
            )))
        },
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Map(record) => Ok(record),
            other => Err(Error::Serialization(format!(
                "record {} must be an object, got {}",
                i,
                other.kind()
            ))),
        })
        .collect()
}
