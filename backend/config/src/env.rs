//! Environment variable substitution and overrides for config values.
//!
//! Supports `${VAR_NAME}` syntax in string values, resolved at load time.
//! Only uppercase `[A-Z_][A-Z0-9_]*` variable names are matched.
//! `$${VAR}` escapes to a literal `${VAR}`.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::DocQueryConfig;

/// A reference, optionally escaped with a leading `$`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var regex"));

/// Fields whose unresolved references leave the field unset instead of
/// failing the load. Validation reports them.
pub const CREDENTIAL_PATHS: &[&str] = &["llm.apiKey"];

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config JSON value tree.
///
/// Only string leaves are processed. Any referenced variable that is unset
/// or empty is an error, except under [`CREDENTIAL_PATHS`] where the field
/// becomes `null`.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute env vars using a provided map (useful for testing).
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let result: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(result?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                let resolved = match substitute_value(v, env, &child_path) {
                    Err(e)
                        if CREDENTIAL_PATHS.contains(&child_path.as_str())
                            && e.downcast_ref::<MissingEnvVarError>().is_some() =>
                    {
                        tracing::warn!(path = %child_path, error = %e, "Credential left unset");
                        Value::Null
                    }
                    other => other?,
                };
                result.insert(k.clone(), resolved);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Collect all env var names referenced in a config value tree (for diagnostics).
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    let mut vars = Vec::new();
    collect_vars_recursive(value, &mut vars);
    vars.sort();
    vars.dedup();
    vars
}

fn collect_vars_recursive(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for caps in ENV_VAR_PATTERN.captures_iter(s) {
                if caps[1].is_empty() {
                    out.push(caps[2].to_string());
                }
            }
        }
        Value::Array(arr) => arr.iter().for_each(|v| collect_vars_recursive(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_vars_recursive(v, out)),
        _ => {}
    }
}

/// Apply process-environment overrides on top of file values.
///
/// `OPENAI_BASE_URL` and `OLLAMA_URL` only apply to their own provider.
pub fn apply_env_overrides(
    mut config: DocQueryConfig,
    env: &HashMap<String, String>,
) -> Result<DocQueryConfig> {
    let get = |key: &str| {
        env.get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    if let Some(bind) = get("DOCQUERY_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = get("DOCQUERY_PORT") {
        config.server.port = port
            .parse()
            .with_context(|| format!("DOCQUERY_PORT must be a port number, got '{port}'"))?;
    }
    if let Some(provider) = get("DOCQUERY_PROVIDER") {
        config.llm.provider = provider.to_ascii_lowercase();
    }
    if let Some(model) = get("DOCQUERY_MODEL") {
        config.llm.model = Some(model);
    }
    if let Some(key) = get("OPENAI_API_KEY") {
        config.llm.api_key = Some(key);
    }
    match config.llm.provider.as_str() {
        "openai" => {
            if let Some(url) = get("OPENAI_BASE_URL") {
                config.llm.base_url = Some(url);
            }
        }
        "ollama" => {
            if let Some(url) = get("OLLAMA_URL") {
                config.llm.base_url = Some(url);
            }
        }
        _ => {}
    }
    if let Some(level) = get("RUST_LOG") {
        config.logging.level = level;
    }
    Ok(config)
}
