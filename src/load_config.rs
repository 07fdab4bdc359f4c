//! `load_config` module: reads the optional YAML configuration file into [`Config`].
//!
//! Every section and key is optional; whatever the file leaves out keeps the
//! defaults from [`crate::config`]. Errors use `anyhow::Error` and are surfaced
//! at the CLI boundary.

use crate::config::Config;
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Loads a YAML config file. Returns an error naming the file when it cannot
/// be read, or saying the YAML could not be parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file is a valid "all defaults" config; serde_yaml rejects it.
    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty, using defaults");
        return Ok(Config::default());
    }

    match serde_yaml::from_str::<Config>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Loads `path` when given, otherwise the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => {
            info!("No config file given, using defaults");
            Config::default()
        }
    };
    config.trace_loaded();
    Ok(config)
}
