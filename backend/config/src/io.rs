//! Config file location and reading.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the DocQuery config directory: `~/.docquery/`.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".docquery"))
        .unwrap_or_else(|| PathBuf::from(".docquery"))
}

/// Resolve the config file path.
/// Priority: `DOCQUERY_CONFIG` env > `~/.docquery/config.yaml`
pub fn config_file_path() -> PathBuf {
    match std::env::var("DOCQUERY_CONFIG") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => config_dir().join(CONFIG_FILE_NAME),
    }
}

/// Read the raw config tree from disk.
///
/// Returns an empty object if the file doesn't exist (first run). An empty
/// file is also an empty object.
pub async fn load_config(path: &Path) -> Result<Value> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(match value {
        Value::Null => Value::Object(Default::default()),
        other => other,
    })
}
