use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docquery_core::{LlmProvider, LlmRequest, LlmResponse};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama local LLM provider.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
    options: SamplingOptions<'a>,
}

#[derive(Serialize)]
struct SamplingOptions<'a> {
    temperature: f32,
    num_predict: u32,
    #[serde(skip_serializing_if = "no_stops")]
    stop: &'a [String],
}

fn no_stops(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
    message: ReplyMessage,
    #[serde(default)]
    eval_count: u64,
    #[serde(default)]
    prompt_eval_count: u64,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

/// Model name as Ollama knows it, without an `ollama/` style prefix.
fn local_model_name(model: &str) -> &str {
    model.rsplit_once('/').map_or(model, |(_, name)| name)
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        let model = local_model_name(&request.model);

        let system = (!request.system_prompt.is_empty()).then(|| Message {
            role: "system",
            content: &request.system_prompt,
        });
        let messages = system
            .into_iter()
            .chain(std::iter::once(Message {
                role: "user",
                content: &request.user_prompt,
            }))
            .collect();

        let body = ChatBody {
            model,
            messages,
            stream: false,
            options: SamplingOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
                stop: &request.stop,
            },
        };

        debug!(model, url = %self.base_url, "Sending chat request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Could not reach Ollama at {}", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {detail}");
        }

        let reply: ChatReply = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(LlmResponse {
            content: reply.message.content,
            provider: "ollama".to_string(),
            model: model.to_string(),
            tokens_used: reply.eval_count + reply.prompt_eval_count,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn strips_provider_prefix() {
        assert_eq!(local_model_name("ollama/llama3.1"), "llama3.1");
        assert_eq!(local_model_name("mistral"), "mistral");
    }

    #[tokio::test]
    async fn posts_to_api_chat_with_options() {
        let router = Router::new().route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "llama3.1");
                assert_eq!(body["stream"], false);
                assert_eq!(body["options"]["num_predict"], 128);
                Json(json!({
                    "message": {"role": "assistant", "content": "Final Answer: 3"},
                    "eval_count": 5,
                    "prompt_eval_count": 20
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let provider = OllamaProvider::new().with_base_url(format!("http://{addr}"));
        let response = provider
            .complete(&LlmRequest {
                model: "ollama/llama3.1".into(),
                system_prompt: String::new(),
                user_prompt: "q".into(),
                max_tokens: 128,
                temperature: 0.0,
                stop: Vec::new(),
            })
            .await
            .unwrap();
        assert_eq!(response.content, "Final Answer: 3");
        assert_eq!(response.tokens_used, 25);
        assert_eq!(response.model, "llama3.1");
    }
}
