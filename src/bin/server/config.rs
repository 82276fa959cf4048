//! Server Configuration
//!
//! Resolves which configuration file the server runs with.

use dimfilter::config::Config;
use std::path::Path;

/// Local configuration file name
const LOCAL_CONFIG: &str = "dimfilter.toml";

/// Load configuration from file or environment
///
/// Priority:
/// 1. DIMFILTER_CONFIG environment variable
/// 2. ./dimfilter.toml
/// 3. Default configuration
///
/// Environment overrides are applied in every case.
pub fn load_config() -> Config {
    if let Ok(path) = std::env::var("DIMFILTER_CONFIG") {
        match Config::from_file_with_env(&path) {
            Ok(config) => {
                eprintln!("[config] Loaded configuration from: {}", path);
                return config;
            },
            Err(e) => {
                eprintln!(
                    "[config] Failed to load config from {}: {}. Trying defaults.",
                    path, e
                );
            },
        }
    }

    let local = Path::new(LOCAL_CONFIG);
    if local.exists() {
        match Config::from_file_with_env(local) {
            Ok(config) => {
                eprintln!("[config] Loaded configuration from {}", LOCAL_CONFIG);
                return config;
            },
            Err(e) => {
                eprintln!(
                    "[config] Failed to parse {}: {}. Using defaults.",
                    LOCAL_CONFIG, e
                );
            },
        }
    }

    eprintln!("[config] Using default configuration");
    let mut config = Config::default();
    config.apply_env_overrides();
    config
}
