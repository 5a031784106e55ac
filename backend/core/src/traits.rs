use anyhow::Result;
use async_trait::async_trait;

/// A capability the table agent can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name of the tool (e.g., "count_rows").
    fn name(&self) -> &str;

    /// Description for the LLM prompt.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments and return the observation text.
    async fn execute(&self, args: serde_json::Value) -> Result<String>;
}

/// Trait for LLM providers backing the query executor.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Send a completion request and return the response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Sequences at which generation must stop (the ReAct loop stops before `Observation:`).
    pub stop: Vec<String>,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
