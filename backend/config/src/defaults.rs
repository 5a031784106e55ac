//! Config defaults: constants behind the schema's `Default` impls, plus the
//! provider-dependent values filled in after loading.

use crate::schema::DocQueryConfig;

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_MAX_AGENT_STEPS: usize = 10;

pub const DEFAULT_MAX_HISTORY_TURNS: usize = 20;
pub const DEFAULT_MAX_DOCUMENT_CHARS: usize = 100_000;

pub const DEFAULT_RENDER_WIDTH: u32 = 1200;
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const KNOWN_PROVIDERS: &[&str] = &["openai", "ollama", "mock"];

/// Default model for a provider, if it has one.
pub fn default_model(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("gpt-4o-mini"),
        "ollama" => Some("llama3.1"),
        "mock" => Some("mock"),
        _ => None,
    }
}

/// Default API base URL for a provider, if it has one.
pub fn default_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("https://api.openai.com/v1"),
        "ollama" => Some("http://localhost:11434"),
        _ => None,
    }
}

/// Apply all provider-dependent defaults to a loaded config.
pub fn apply_all_defaults(mut config: DocQueryConfig) -> DocQueryConfig {
    let llm = &mut config.llm;
    llm.provider = llm.provider.trim().to_ascii_lowercase();
    if llm.model.as_deref().map(str::trim).unwrap_or("").is_empty() {
        llm.model = default_model(&llm.provider).map(str::to_string);
    }
    if llm.base_url.as_deref().map(str::trim).unwrap_or("").is_empty() {
        llm.base_url = default_base_url(&llm.provider).map(str::to_string);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_model_and_url_for_openai() {
        let cfg = apply_all_defaults(DocQueryConfig::default());
        assert_eq!(cfg.llm.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(cfg.llm.base_url.as_deref(), Some("https://api.openai.com/v1"));
    }

    #[test]
    fn does_not_override_user_model() {
        let mut cfg = DocQueryConfig::default();
        cfg.llm.provider = "Ollama".into();
        cfg.llm.model = Some("qwen2.5".into());
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.llm.provider, "ollama");
        assert_eq!(cfg.llm.model.as_deref(), Some("qwen2.5"));
        assert_eq!(cfg.llm.base_url.as_deref(), Some("http://localhost:11434"));
    }

    #[test]
    fn mock_has_no_base_url() {
        let mut cfg = DocQueryConfig::default();
        cfg.llm.provider = "mock".into();
        let cfg = apply_all_defaults(cfg);
        assert!(cfg.llm.base_url.is_none());
    }
}
