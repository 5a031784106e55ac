//! Wiring from a prepared config to the session components.

use std::sync::Arc;

use docquery_agent::{ModelConfig, PromptBudget, QueryExecutor};
use docquery_config::defaults::default_base_url;
use docquery_config::DocQueryConfig;
use docquery_core::{DocQueryError, LlmProvider};
use docquery_gateway::SetupStatus;
use docquery_loader::{DocumentLoader, PdfiumRasterizer};
use docquery_planner::{MockProvider, OllamaProvider, OpenAiProvider, ProviderRegistry};
use tracing::{info, warn};

const MOCK_ANSWER: &str = "Final Answer: This is a mock response; configure llm.provider for real answers.";

/// Everything a front end needs to run document-query sessions.
pub struct Runtime {
    pub config: DocQueryConfig,
    pub loader: DocumentLoader,
    /// `None` when the configured provider is unusable.
    pub executor: Option<QueryExecutor>,
    pub setup: SetupStatus,
}

impl Runtime {
    pub fn build(config: DocQueryConfig) -> Self {
        let rasterizer = PdfiumRasterizer::new(
            config.pdf.pdfium_library_path.clone(),
            config.pdf.render_width,
        );
        let loader = DocumentLoader::new(Arc::new(rasterizer));

        let registry = build_registry(&config);
        let (executor, message) = match select_provider(&config, &registry) {
            Ok(provider) => {
                info!(provider = %provider.name(), model = %model_name(&config), "Language model ready");
                let executor = QueryExecutor::new(
                    provider,
                    ModelConfig {
                        model_name: model_name(&config),
                        max_tokens: config.llm.max_tokens,
                        max_agent_steps: config.llm.max_agent_steps,
                    },
                )
                .with_budget(PromptBudget::new(
                    config.prompt.max_history_turns,
                    config.prompt.max_document_chars,
                ));
                (Some(executor), None)
            }
            Err(e) => {
                warn!(error = %e, "Queries are disabled until setup is fixed");
                let message = match e {
                    DocQueryError::Setup(message) => message,
                    other => other.to_string(),
                };
                (None, Some(message))
            }
        };

        let setup = SetupStatus {
            credential_present: executor.is_some(),
            provider: config.llm.provider.clone(),
            model: model_name(&config),
            default_temperature: config.llm.temperature,
            message,
        };

        Self {
            config,
            loader,
            executor,
            setup,
        }
    }

    /// The executor, or the setup error that disabled it.
    pub fn executor(&self) -> Result<&QueryExecutor, DocQueryError> {
        self.executor.as_ref().ok_or_else(|| {
            DocQueryError::Setup(self.setup.message.clone().unwrap_or_default())
        })
    }
}

fn model_name(config: &DocQueryConfig) -> String {
    config.llm.model.clone().unwrap_or_default()
}

fn base_url_for(config: &DocQueryConfig, provider: &str) -> Option<String> {
    if config.llm.provider == provider {
        if let Some(url) = &config.llm.base_url {
            return Some(url.clone());
        }
    }
    default_base_url(provider).map(str::to_string)
}

/// Register every provider that can be constructed from the config.
pub fn build_registry(config: &DocQueryConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    if let Some(api_key) = config.llm.api_key.as_deref().filter(|_| config.llm.has_api_key()) {
        let mut provider = OpenAiProvider::new(api_key);
        if let Some(url) = base_url_for(config, "openai") {
            provider = provider.with_base_url(url);
        }
        registry.register("openai", Arc::new(provider));
    }

    let mut ollama = OllamaProvider::new();
    if let Some(url) = base_url_for(config, "ollama") {
        ollama = ollama.with_base_url(url);
    }
    registry.register("ollama", Arc::new(ollama));

    registry.register("mock", Arc::new(MockProvider::new("mock").with_response(MOCK_ANSWER)));
    registry
}

/// The configured provider, or a setup error a user can act on.
pub fn select_provider(
    config: &DocQueryConfig,
    registry: &ProviderRegistry,
) -> Result<Arc<dyn LlmProvider>, DocQueryError> {
    let name = config.llm.provider.as_str();
    match registry.get(name) {
        Some(provider) => Ok(provider),
        None if name == "openai" => Err(DocQueryError::Setup(
            "OPENAI_API_KEY is not set. Add it to the environment or a .env file and restart"
                .to_string(),
        )),
        None => Err(DocQueryError::Setup(format!(
            "unknown provider '{name}'; available: {}",
            registry.list().join(", ")
        ))),
    }
}
