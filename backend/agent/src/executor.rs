//! Query execution: routes a built prompt to the right reasoning path for the
//! bound document and sequences a full turn.

use std::sync::Arc;

use docquery_core::{DocQueryError, LlmProvider, LlmRequest, Result};
use docquery_loader::Document;
use tracing::{info, instrument, warn};

use crate::agent_loop::{TableAgent, DEFAULT_MAX_STEPS};
use crate::context_window::PromptBudget;
use crate::dataset_tools::dataset_tools;
use crate::session_state::Session;
use crate::system_prompt::PromptBuilder;
use crate::tool_dispatcher::ToolDispatcher;

/// Settings for the model behind the executor.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_name: String,
    pub max_tokens: u32,
    pub max_agent_steps: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            max_agent_steps: DEFAULT_MAX_STEPS,
        }
    }
}

#[derive(Clone)]
pub struct QueryExecutor {
    provider: Arc<dyn LlmProvider>,
    model: ModelConfig,
    budget: PromptBudget,
}

impl QueryExecutor {
    pub fn new(provider: Arc<dyn LlmProvider>, model: ModelConfig) -> Self {
        Self {
            provider,
            model,
            budget: PromptBudget::default(),
        }
    }

    pub fn with_budget(mut self, budget: PromptBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Answer `prompt` against `document`.
    ///
    /// Tabular documents go through the tool-using agent; pdf documents get a
    /// single completion with no tools. Every failure on the way is reported
    /// as [`DocQueryError::AgentExecutionError`].
    #[instrument(skip_all, fields(document = document.kind_label(), temperature = temperature))]
    pub async fn execute(&self, prompt: &str, document: &Document, temperature: f32) -> Result<String> {
        match document {
            Document::None => Err(DocQueryError::NoDocument),
            Document::Tabular(data) => {
                let tools = ToolDispatcher::new(dataset_tools(Arc::clone(data)));
                TableAgent::new(self.provider.clone(), self.model.model_name.clone())
                    .with_max_tokens(self.model.max_tokens)
                    .with_max_steps(self.model.max_agent_steps)
                    .run(prompt, &tools, temperature)
                    .await
                    .map_err(DocQueryError::agent)
            }
            Document::Pdf(_) => {
                let request = LlmRequest {
                    model: self.model.model_name.clone(),
                    system_prompt: String::new(),
                    user_prompt: prompt.to_string(),
                    max_tokens: self.model.max_tokens,
                    temperature,
                    stop: Vec::new(),
                };
                let response = self
                    .provider
                    .complete(&request)
                    .await
                    .map_err(DocQueryError::agent)?;
                Ok(response.content.trim().to_string())
            }
        }
    }

    /// One full turn: build the prompt, execute it and append the exchange.
    /// History is only touched when execution succeeds.
    pub async fn run_turn(&self, session: &mut Session, query: &str, temperature: f32) -> Result<String> {
        let prompt = PromptBuilder::for_session(session, query, &self.budget)?;
        match self.execute(&prompt, &session.document, temperature).await {
            Ok(answer) => {
                session.history.append_turn(query, answer.clone());
                info!(session_id = %session.id, entries = session.history.len(), "Turn completed");
                Ok(answer)
            }
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "Turn failed");
                Err(e)
            }
        }
    }
}
