//! `docquery-config`: DocQuery runtime configuration.
//!
//! Provides:
//! - Typed config schema with serde defaults
//! - YAML loading from `DOCQUERY_CONFIG` or `~/.docquery/config.yaml`
//! - `${ENV_VAR}` substitution and environment overrides
//! - Provider-dependent defaults
//! - Validation and redaction for display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides, collect_referenced_vars, resolve_env_vars, resolve_env_vars_with,
    MissingEnvVarError,
};
pub use io::{config_dir, config_file_path, load_config};
pub use redact::redact;
pub use schema::{DocQueryConfig, LlmConfig, LoggingConfig, PdfConfig, PromptConfig, ServerConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load a config file and prepare it against the process environment.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<DocQueryConfig> {
    let raw = load_config(path).await?;
    prepare(&raw, &std::env::vars().collect())
}

/// Substitute env vars, deserialize, apply env overrides and defaults, then
/// log the validation report.
pub fn prepare(raw: &Value, env: &HashMap<String, String>) -> Result<DocQueryConfig> {
    let value = resolve_env_vars_with(raw, env).context("Failed to resolve env vars in config")?;

    let config: DocQueryConfig =
        serde_json::from_value(value).context("Failed to deserialize config")?;
    let config = apply_env_overrides(config, env)?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }

    Ok(config)
}

/// Config as JSON with credentials masked.
pub fn redacted_json(config: &DocQueryConfig) -> Result<Value> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    Ok(redact(&value))
}
