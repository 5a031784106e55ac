//! DocQuery runtime configuration schema.
//!
//! Every section has serde defaults, so a partial (or empty) YAML file
//! deserializes into a complete config.

use serde::{Deserialize, Serialize};

use crate::defaults::*;

/// Root configuration for DocQuery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocQueryConfig {
    /// HTTP gateway settings
    pub server: ServerConfig,

    /// Language model provider and sampling settings
    pub llm: LlmConfig,

    /// Limits applied when building query prompts
    pub prompt: PromptConfig,

    /// PDF rasterization settings
    pub pdf: PdfConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Largest accepted request body, uploads included.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmConfig {
    /// `openai`, `ollama` or `mock`
    pub provider: String,
    /// Filled per provider by [`crate::apply_all_defaults`] when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default sampling temperature, in [0.0, 1.0].
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_agent_steps: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: None,
            api_key: None,
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_agent_steps: DEFAULT_MAX_AGENT_STEPS,
        }
    }
}

impl LlmConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptConfig {
    /// History entries kept in the prompt; one exchange is two entries.
    pub max_history_turns: usize,
    pub max_document_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_history_turns: DEFAULT_MAX_HISTORY_TURNS,
            max_document_chars: DEFAULT_MAX_DOCUMENT_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PdfConfig {
    /// Target width in pixels of rendered page images.
    pub render_width: u32,
    /// Directory holding the pdfium shared library; system lookup when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdfium_library_path: Option<String>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_width: DEFAULT_RENDER_WIDTH,
            pdfium_library_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Level or `EnvFilter` directive, e.g. `info` or `docquery_agent=debug`.
    pub level: String,
    /// Directory for daily-rolling JSON log files; console only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "llm:\n  provider: ollama\n  temperature: 0.1\nserver:\n  port: 9000\n";
        let cfg: DocQueryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.llm.provider, "ollama");
        assert!((cfg.llm.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(cfg.llm.max_agent_steps, DEFAULT_MAX_AGENT_STEPS);
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind, DEFAULT_BIND);
        assert_eq!(cfg.prompt.max_history_turns, 20);
    }

    #[test]
    fn keys_are_camel_case() {
        let value = serde_json::to_value(DocQueryConfig::default()).unwrap();
        assert_eq!(value["server"]["maxUploadBytes"], 200 * 1024 * 1024);
        assert_eq!(value["prompt"]["maxDocumentChars"], 100_000);
        assert!(value["llm"].get("apiKey").is_none());
    }
}
