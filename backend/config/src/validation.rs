//! Config validation: checks with user-friendly error messages.

use crate::defaults::KNOWN_PROVIDERS;
use crate::schema::DocQueryConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &DocQueryConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_llm(config, &mut report);
    validate_prompt(config, &mut report);
    validate_pdf(config, &mut report);
    report
}

fn validate_server(config: &DocQueryConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.bind.trim().is_empty() {
        report.error("server.bind", "bind address cannot be empty");
    }
    if server.port != 0 && server.port < 1024 {
        report.warn(
            "server.port",
            format!(
                "Port {} requires elevated privileges; consider using a port >= 1024",
                server.port
            ),
        );
    }
    if server.max_upload_bytes == 0 {
        report.error("server.maxUploadBytes", "maxUploadBytes must be > 0");
    }
}

fn validate_llm(config: &DocQueryConfig, report: &mut ValidationReport) {
    let llm = &config.llm;
    if !KNOWN_PROVIDERS.contains(&llm.provider.as_str()) {
        report.error(
            "llm.provider",
            format!(
                "Unknown provider '{}'. Use one of: {}",
                llm.provider,
                KNOWN_PROVIDERS.join(", ")
            ),
        );
    }
    if llm.provider == "openai" && !llm.has_api_key() {
        report.warn(
            "llm.apiKey",
            "No OpenAI API key configured; set OPENAI_API_KEY. Queries will fail until it is set",
        );
    }
    if !(0.0..=1.0).contains(&llm.temperature) {
        report.error(
            "llm.temperature",
            format!("temperature must be within [0.0, 1.0], got {}", llm.temperature),
        );
    } else if llm.temperature > 0.7 {
        report.warn("llm.temperature", "temperatures above 0.7 may produce hallucinations");
    }
    if llm.max_tokens == 0 {
        report.error("llm.maxTokens", "maxTokens must be > 0");
    }
    if llm.max_agent_steps == 0 {
        report.error("llm.maxAgentSteps", "maxAgentSteps must be >= 1");
    }
    if llm.model.as_deref().map(str::trim).unwrap_or("").is_empty() {
        report.error("llm.model", "No model configured for this provider");
    }
}

fn validate_prompt(config: &DocQueryConfig, report: &mut ValidationReport) {
    if config.prompt.max_history_turns == 0 {
        report.error("prompt.maxHistoryTurns", "maxHistoryTurns must be > 0");
    }
    if config.prompt.max_document_chars == 0 {
        report.error("prompt.maxDocumentChars", "maxDocumentChars must be > 0");
    }
}

fn validate_pdf(config: &DocQueryConfig, report: &mut ValidationReport) {
    if config.pdf.render_width == 0 {
        report.error("pdf.renderWidth", "renderWidth must be > 0");
    }
}
